use trellis_core::{GraphError, IdentityKind, PackageCoordinate, Subject, SubjectType};

#[test]
fn test_subject_type_parsing() {
    assert_eq!("Package".parse::<SubjectType>().unwrap(), SubjectType::Package);
    assert_eq!("source".parse::<SubjectType>().unwrap(), SubjectType::Source);
    let err = "image".parse::<SubjectType>().unwrap_err();
    assert!(matches!(
        err,
        GraphError::MalformedIdentity {
            kind: IdentityKind::SubjectType,
            ..
        }
    ));
}

#[test]
fn test_subject_parse_dispatches_on_type() {
    let subject = Subject::parse(SubjectType::Package, "pkg:pypi/Django_Rest@3.14").unwrap();
    assert_eq!(subject.subject_type(), SubjectType::Package);
    assert_eq!(subject.to_string(), "pkg:pypi/django-rest@3.14");

    let subject = Subject::parse(SubjectType::Artifact, "sha256:ABC").unwrap();
    assert_eq!(subject.to_string(), "sha256:abc");
}

#[test]
fn test_malformed_identity_reports_kind() {
    let err = Subject::parse(SubjectType::Source, "github.com/guacsec/guac").unwrap_err();
    assert!(matches!(
        err,
        GraphError::MalformedIdentity {
            kind: IdentityKind::Source,
            ..
        }
    ));

    for bad in ["sha256", "sha256-abcd", "a:b:c", ":abcd"] {
        let err = Subject::parse(SubjectType::Artifact, bad).unwrap_err();
        assert!(matches!(
            err,
            GraphError::MalformedIdentity {
                kind: IdentityKind::Artifact,
                ..
            }
        ));
    }

    let err = Subject::parse(SubjectType::Package, "npm/lodash").unwrap_err();
    assert!(matches!(
        err,
        GraphError::MalformedIdentity {
            kind: IdentityKind::Package,
            ..
        }
    ));
}

#[test]
fn test_purl_canonical_form() {
    let coord =
        PackageCoordinate::parse("pkg:maven/org.apache.commons/commons-lang3@3.12.0?type=jar&classifier=sources")
            .unwrap();
    assert_eq!(coord.namespace, "org.apache.commons");
    let keys: Vec<&str> = coord.qualifiers.iter().map(|q| q.key.as_str()).collect();
    assert_eq!(keys, vec!["classifier", "type"]);
    assert_eq!(
        coord.to_purl(),
        "pkg:maven/org.apache.commons/commons-lang3@3.12.0?classifier=sources&type=jar"
    );
}

#[test]
fn test_versioned_purl_spec_pins_version_level() {
    let coord = PackageCoordinate::parse("pkg:npm/lodash@4.17.21").unwrap();
    let spec = coord.to_spec();
    assert!(spec.targets_version());
    assert_eq!(spec.subpath.as_deref(), Some(""));
    assert_eq!(spec.match_only_empty_qualifiers, Some(true));
}
