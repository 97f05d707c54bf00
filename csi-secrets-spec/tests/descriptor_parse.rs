use csi_secrets_spec::{
    Error, FilePermission, GlobalParams, ObjectEncoding, ParseOptions, SecretType,
};
use std::path::Path;

const MOUNT_DIR: &str = "/mnt/secrets-store";

fn regions(list: &[&str]) -> Vec<String> {
    list.iter().map(|r| r.to_string()).collect()
}

fn parse_with(
    document: &str,
    translation: Option<&str>,
    regions: &[String],
) -> csi_secrets_spec::Result<GlobalParams> {
    let options = ParseOptions {
        mount_dir: Path::new(MOUNT_DIR),
        path_translation: translation,
        regions,
        default_permission: FilePermission::DEFAULT,
    };
    GlobalParams::parse(document, &options)
}

fn parse(document: &str) -> csi_secrets_spec::Result<GlobalParams> {
    parse_with(document, None, &regions(&["us-west-2"]))
}

#[test]
fn groups_by_store_kind_in_document_order() {
    let doc = r#"
- objectName: "arn:aws:secretsmanager:us-west-2:123456789012:secret:db-AbCdEf"
  objectAlias: db
- objectName: /app/one
  objectType: ssmparameter
- objectName: api-key
  objectType: secretsmanager
- objectName: /app/two
  objectType: ssmparameter
"#;
    let params = parse(doc).expect("valid document");
    let groups = params.groups();
    let sm: Vec<_> = groups[&SecretType::SecretsManager]
        .iter()
        .map(|d| d.file_name())
        .collect();
    let ssm: Vec<_> = groups[&SecretType::SsmParameter]
        .iter()
        .map(|d| d.file_name())
        .collect();
    assert_eq!(sm, vec!["db", "api-key"]);
    assert_eq!(ssm, vec!["_app_one", "_app_two"]);
    assert_eq!(params.descriptor_count(), 4);
}

#[test]
fn accepts_objects_mapping_with_join_name() {
    let doc = r#"
objects:
  - objectName: creds
    objectType: secretsmanager
    objectTemplate: "{{user}}"
joinName: combined
"#;
    let params = parse(doc).expect("valid document");
    assert_eq!(params.join_name(), Some("combined"));
    let descriptor = &params.groups()[&SecretType::SecretsManager][0];
    assert!(descriptor.is_templated());
}

#[test]
fn empty_document_yields_no_groups() {
    let params = parse("").expect("empty document");
    assert!(params.groups().is_empty());
}

#[test]
fn malformed_document_is_rejected() {
    let err = parse("- objectName: [unterminated").unwrap_err();
    assert!(matches!(err, Error::MalformedDocument(_)), "{err}");
}

#[test]
fn duplicate_name_without_alias_or_label() {
    let doc = "- objectName: secret1\n  objectType: ssmparameter\n- objectName: secret1\n  objectType: ssmparameter\n";
    let err = parse(doc).unwrap_err();
    assert_eq!(
        err.to_string(),
        "found descriptor with duplicate object name secret1, no object alias, and no version label"
    );
}

#[test]
fn duplicate_name_distinguished_by_alias_or_label() {
    let by_alias = r#"
- objectName: secret1
  objectType: secretsmanager
  objectAlias: first
- objectName: secret1
  objectType: secretsmanager
  objectAlias: second
"#;
    assert!(parse(by_alias).is_ok());

    let by_label = r#"
- objectName: secret1
  objectType: secretsmanager
  objectVersionLabel: AWSCURRENT
- objectName: secret1
  objectType: secretsmanager
  objectVersionLabel: AWSPREVIOUS
"#;
    assert!(parse(by_label).is_ok());
}

#[test]
fn duplicate_name_alias_and_label() {
    let doc = r#"
- objectName: secret1
  objectType: secretsmanager
  objectAlias: a
  objectVersionLabel: AWSPREVIOUS
- objectName: secret1
  objectType: secretsmanager
  objectAlias: a
  objectVersionLabel: AWSPREVIOUS
"#;
    assert_eq!(
        parse(doc).unwrap_err().to_string(),
        "found descriptor with duplicate object name secret1, duplicate object alias a, and duplicate version label AWSPREVIOUS"
    );
}

#[test]
fn alias_must_be_unique_across_descriptors_and_jmes_entries() {
    let doc = r#"
- objectName: one
  objectType: secretsmanager
  objectAlias: shared
- objectName: two
  objectType: secretsmanager
  objectAlias: shared
"#;
    assert_eq!(parse(doc).unwrap_err(), Error::DuplicateAlias("shared".into()));

    let doc = r#"
- objectName: one
  objectType: secretsmanager
  objectAlias: username
- objectName: two
  objectType: secretsmanager
  jmesPath:
    - path: user
      objectAlias: username
"#;
    assert_eq!(
        parse(doc).unwrap_err().to_string(),
        "name already in use for objectAlias: found duplicate object alias username in JMES path entry user"
    );
}

#[test]
fn traversal_is_rejected_after_translation() {
    let doc = "- objectName: ../etc/passwd\n  objectType: ssmparameter\n";
    // Default translation turns the separators into underscores.
    assert!(parse(doc).is_ok());

    let err = parse_with(doc, Some("False"), &regions(&["us-west-2"])).unwrap_err();
    assert_eq!(err, Error::PathTraversal("../etc/passwd".into()));

    let doc = "- objectName: secret\n  objectType: ssmparameter\n  objectAlias: a/../b\n";
    assert!(parse_with(doc, Some("false"), &regions(&["us-west-2"])).is_err());
}

#[test]
fn absolute_file_names_are_rejected() {
    let doc = "- objectName: //etc/shadow\n  objectType: secretsmanager\n";
    // Only one leading separator is stripped when translation is disabled.
    let err = parse_with(doc, Some("False"), &regions(&["us-west-2"])).unwrap_err();
    assert_eq!(err, Error::PathTraversal("//etc/shadow".into()));

    assert_eq!(
        parse_with(doc, Some("/"), &regions(&["us-west-2"])).unwrap_err(),
        Error::InvalidPathTranslation
    );

    let translated = parse(doc).unwrap();
    let descriptor = &translated.groups()[&SecretType::SecretsManager][0];
    assert_eq!(descriptor.file_name(), "__etc_shadow");
    assert!(descriptor.mount_path().starts_with(MOUNT_DIR));

    let doc = "- objectName: /\n  objectType: secretsmanager\n";
    assert!(parse_with(doc, Some("False"), &regions(&["us-west-2"])).is_err());
}

#[test]
fn bare_parent_directory_name_is_traversal() {
    let doc = "- objectName: db\n  objectType: secretsmanager\n  objectAlias: ..\n";
    assert_eq!(parse(doc).unwrap_err(), Error::PathTraversal("db".into()));
}

#[test]
fn jmes_aliases_are_checked_for_traversal() {
    let doc = r#"
- objectName: db
  objectType: secretsmanager
  jmesPath:
    - path: password
      objectAlias: ../../etc/cron.d/x
"#;
    assert_eq!(
        parse_with(doc, Some("False"), &regions(&["us-west-2"])).unwrap_err(),
        Error::PathTraversal("../../etc/cron.d/x".into())
    );
    // With the default translation the alias stays inside the mount.
    let params = parse(doc).unwrap();
    let parent = &params.groups()[&SecretType::SecretsManager][0];
    let child = parent.jmes_child(&parent.jmes_entries()[0]);
    assert_eq!(child.file_name(), ".._.._etc_cron.d_x");
    assert!(child.mount_path().starts_with(MOUNT_DIR));

    let doc = r#"
- objectName: db
  objectType: secretsmanager
  jmesPath:
    - path: password
      objectAlias: /etc/passwd
"#;
    assert!(matches!(
        parse_with(doc, Some("False"), &regions(&["us-west-2"])),
        Err(Error::PathTraversal(_))
    ));
}

#[test]
fn join_name_is_checked_for_traversal() {
    let doc = "joinName: ../../etc/x\nobjects:\n  - objectName: db\n    objectType: secretsmanager\n";
    assert_eq!(
        parse_with(doc, Some("False"), &regions(&["us-west-2"])).unwrap_err(),
        Error::PathTraversal("../../etc/x".into())
    );
    let doc = "joinName: ..\nobjects: []\n";
    assert!(parse(doc).is_err());

    let doc = "joinName: ../../etc/x\nobjects:\n  - objectName: db\n    objectType: secretsmanager\n";
    assert_eq!(parse(doc).unwrap().join_name(), Some("../../etc/x"));
}

#[test]
fn dots_inside_a_name_are_not_traversal() {
    let doc = "- objectName: my..secret\n  objectType: secretsmanager\n- objectName: a/..b\n  objectType: secretsmanager\n";
    assert!(parse_with(doc, Some("False"), &regions(&["us-west-2"])).is_ok());
}

#[test]
fn arn_region_must_match_configured_region() {
    let doc = "- objectName: arn:aws:secretsmanager:us-east-1:123456789012:secret:db\n";
    assert_eq!(
        parse(doc).unwrap_err().to_string(),
        "ARN region must match region us-west-2: arn:aws:secretsmanager:us-east-1:123456789012:secret:db"
    );
}

#[test]
fn file_name_translation() {
    let doc = "- objectName: /a/b/c\n  objectType: ssmparameter\n";
    let underscore = parse(doc).unwrap();
    let descriptor = &underscore.groups()[&SecretType::SsmParameter][0];
    assert_eq!(descriptor.file_name(), "_a_b_c");
    assert_eq!(
        descriptor.mount_path(),
        Path::new(MOUNT_DIR).join("_a_b_c")
    );

    let dash = parse_with(doc, Some("-"), &regions(&["us-west-2"])).unwrap();
    assert_eq!(dash.groups()[&SecretType::SsmParameter][0].file_name(), "-a-b-c");

    let disabled = parse_with(doc, Some("False"), &regions(&["us-west-2"])).unwrap();
    assert_eq!(
        disabled.groups()[&SecretType::SsmParameter][0].file_name(),
        "a/b/c"
    );

    assert_eq!(
        parse_with(doc, Some("ab"), &regions(&["us-west-2"])).unwrap_err(),
        Error::InvalidPathTranslation
    );
}

#[test]
fn ssm_version_and_label_conflict() {
    let doc = r#"
- objectName: param
  objectType: ssmparameter
  objectVersion: "3"
  objectVersionLabel: prod
"#;
    assert_eq!(parse(doc).unwrap_err(), Error::VersionConflict("param".into()));

    let sm = doc.replace("ssmparameter", "secretsmanager");
    assert!(parse(&sm).is_ok());
}

#[test]
fn failover_without_alias_reports_alias_first() {
    let doc = r#"
- objectName: "arn:aws:secretsmanager:us-west-2:123456789012:secret:db"
  failoverObject:
    objectName: "arn:aws:secretsmanager:us-east-1:123456789012:secret:db"
"#;
    let err = parse(doc).unwrap_err();
    assert!(matches!(err, Error::FailoverAliasRequired(_)), "{err}");

    let with_alias = doc.replace("  failoverObject", "  objectAlias: db\n  failoverObject");
    let err = parse(&with_alias).unwrap_err();
    assert!(matches!(err, Error::FailoverRegionRequired(_)), "{err}");

    let both = regions(&["us-west-2", "us-east-1"]);
    let params = parse_with(&with_alias, None, &both).expect("failover configured");
    let descriptor = &params.groups()[&SecretType::SecretsManager][0];
    assert_eq!(
        descriptor.secret_name(true),
        "arn:aws:secretsmanager:us-east-1:123456789012:secret:db"
    );
    assert_eq!(
        descriptor.secret_name(false),
        "arn:aws:secretsmanager:us-west-2:123456789012:secret:db"
    );
}

#[test]
fn failover_arn_must_match_secondary_region() {
    let doc = r#"
- objectName: db
  objectType: secretsmanager
  objectAlias: db
  failoverObject:
    objectName: "arn:aws:secretsmanager:eu-west-1:123456789012:secret:db"
"#;
    let err = parse_with(doc, None, &regions(&["us-west-2", "us-east-1"])).unwrap_err();
    assert!(matches!(err, Error::RegionMismatch { ref region, .. } if region == "us-east-1"));
}

#[test]
fn failover_versions_must_match() {
    let doc = r#"
- objectName: db
  objectType: secretsmanager
  objectAlias: db
  objectVersion: v1
  failoverObject:
    objectName: db-replica
    objectVersion: v2
"#;
    let err = parse_with(doc, None, &regions(&["us-west-2", "us-east-1"])).unwrap_err();
    assert_eq!(err, Error::FailoverVersionMismatch("db".into()));
}

#[test]
fn failover_falls_back_to_primary_label() {
    let doc = r#"
- objectName: db
  objectType: secretsmanager
  objectAlias: db
  objectVersionLabel: AWSPENDING
  failoverObject:
    objectName: db-replica
"#;
    let params = parse_with(doc, None, &regions(&["us-west-2", "us-east-1"])).unwrap();
    let descriptor = &params.groups()[&SecretType::SecretsManager][0];
    assert_eq!(descriptor.version_label(true), Some("AWSPENDING"));
    assert_eq!(descriptor.secret_name(true), "db-replica");
}

#[test]
fn jmes_entries_validate_and_inherit() {
    let doc = r#"
- objectName: creds
  objectType: secretsmanager
  filePermission: "0600"
  jmesPath:
    - path: username
      objectAlias: user
    - path: cert
      objectAlias: cert
      filePermission: "0640"
      objectEncoding: base64
"#;
    let params = parse(doc).unwrap();
    let parent = &params.groups()[&SecretType::SecretsManager][0];
    let entries = parent.jmes_entries();
    assert_eq!(entries[1].encoding, Some(ObjectEncoding::Base64));

    let user = parent.jmes_child(&entries[0]);
    assert_eq!(user.file_name(), "user");
    assert_eq!(user.file_permission().mode(), 0o600);
    assert_eq!(user.secret_type(), SecretType::SecretsManager);

    let cert = parent.jmes_child(&entries[1]);
    assert_eq!(cert.file_permission().mode(), 0o640);
}

#[test]
fn jmes_entry_errors() {
    let missing_alias = r#"
- objectName: creds
  objectType: secretsmanager
  jmesPath:
    - path: username
"#;
    assert!(matches!(
        parse(missing_alias).unwrap_err(),
        Error::MissingJmesAlias { .. }
    ));

    let bad_encoding = r#"
- objectName: creds
  objectType: secretsmanager
  jmesPath:
    - path: username
      objectAlias: user
      objectEncoding: hex
"#;
    assert_eq!(
        parse(bad_encoding).unwrap_err(),
        Error::InvalidEncoding {
            encoding: "hex".into(),
            path: "username".into()
        }
    );
}

#[test]
fn invalid_file_permission() {
    let doc = "- objectName: creds\n  objectType: secretsmanager\n  filePermission: \"777\"\n";
    assert_eq!(
        parse(doc).unwrap_err(),
        Error::InvalidFilePermission("777".into())
    );
}

#[test]
fn default_permission_is_threaded_from_options() {
    let doc = "- objectName: creds\n  objectType: secretsmanager\n";
    let regions = regions(&["us-west-2"]);
    let options = ParseOptions {
        mount_dir: Path::new(MOUNT_DIR),
        path_translation: None,
        regions: &regions,
        default_permission: FilePermission::from_mode(0o400),
    };
    let params = GlobalParams::parse(doc, &options).unwrap();
    assert_eq!(
        params.groups()[&SecretType::SecretsManager][0]
            .file_permission()
            .mode(),
        0o400
    );
}

#[test]
fn missing_regions_is_a_configuration_error() {
    let doc = "- objectName: creds\n  objectType: secretsmanager\n";
    assert_eq!(parse_with(doc, None, &[]).unwrap_err(), Error::NoRegions);
}
