/// The parts of a fully-qualified resource identifier that validation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn<'a> {
    pub partition: &'a str,
    pub service: &'a str,
    pub region: &'a str,
    pub account: &'a str,
    pub resource: &'a str,
}

const ARN_PREFIX: &str = "arn:";

pub fn is_arn(value: &str) -> bool {
    value.starts_with(ARN_PREFIX)
}

/// Split `arn:partition:service:region:account:resource`. The resource part
/// may itself contain colons.
pub fn parse(value: &str) -> Option<Arn<'_>> {
    let rest = value.strip_prefix(ARN_PREFIX)?;
    let mut parts = rest.splitn(5, ':');
    let partition = parts.next()?;
    let service = parts.next()?;
    let region = parts.next()?;
    let account = parts.next()?;
    let resource = parts.next()?;
    Some(Arn {
        partition,
        service,
        region,
        account,
        resource,
    })
}
