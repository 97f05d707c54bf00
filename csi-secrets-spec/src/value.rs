use crate::descriptor::SecretDescriptor;
use std::fmt;

const REDACTED: &str = "<REDACTED>";

/// Payload for one output file together with the descriptor that produced it.
///
/// The bytes are only reachable through [`SecretValue::bytes`] and
/// [`SecretValue::into_parts`]; `Debug` and `Display` never print them.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue {
    bytes: Vec<u8>,
    descriptor: SecretDescriptor,
}

impl SecretValue {
    pub fn new(bytes: impl Into<Vec<u8>>, descriptor: SecretDescriptor) -> Self {
        Self {
            bytes: bytes.into(),
            descriptor,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn descriptor(&self) -> &SecretDescriptor {
        &self.descriptor
    }

    pub fn into_parts(self) -> (Vec<u8>, SecretDescriptor) {
        (self.bytes, self.descriptor)
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretValue")
            .field("bytes", &REDACTED)
            .field("file", &self.descriptor.file_name())
            .finish()
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}
