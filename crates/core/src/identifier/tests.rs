use super::*;

#[test]
fn bare_name() {
    let parsed = parse_get("reviews", None).expect("bare name parses");
    assert_eq!(
        parsed,
        Identifier {
            workspace: None,
            name: "reviews".to_string(),
            version: None,
            split: None,
        }
    );
}

#[test]
fn workspace_name_and_hex_version() {
    let parsed = parse_get("ws1.reviews@3f2a", None).expect("identifier parses");
    assert_eq!(parsed.workspace.as_deref(), Some("ws1"));
    assert_eq!(parsed.name, "reviews");
    assert_eq!(parsed.version, Some(VersionRef::Hex("3f2a".to_string())));
}

#[test]
fn version_tokens_classify() {
    let latest = parse_get("ws.data@latest", None).expect("latest parses");
    assert_eq!(latest.version, Some(VersionRef::Latest));

    let head = parse_get("ws.data@HEAD", None).expect("HEAD parses");
    assert_eq!(head.version, Some(VersionRef::Head));

    let tag = parse_get("ws.data@v12", None).expect("tag parses");
    assert_eq!(tag.version, Some(VersionRef::Tag(12)));

    // 'v1' is a tag token, never a hex prefix; bare hex stays hex.
    let hex = parse_get("ws.data@badc0ffee", None).expect("hex parses");
    assert_eq!(hex.version, Some(VersionRef::Hex("badc0ffee".to_string())));

    // Uppercase digests normalize to the stored lowercase form.
    let hex = parse_get("ws.data@BADC0FFEE", None).expect("uppercase hex parses");
    assert_eq!(hex.version, Some(VersionRef::Hex("badc0ffee".to_string())));
}

#[test]
fn split_selector() {
    let parsed = parse_get("ws.reviews@latest[train]", None).expect("split parses");
    assert_eq!(parsed.split, Some(Split::Train));
    assert_eq!(parsed.version, Some(VersionRef::Latest));

    let parsed = parse_get("ws.reviews[val]", None).expect("split without version parses");
    assert_eq!(parsed.split, Some(Split::Val));
    assert_eq!(parsed.version, None);

    assert_eq!(
        parse_get("ws.reviews[dev]", None).unwrap_err(),
        ParseError::UnknownSplit {
            token: "dev".to_string()
        }
    );
}

#[test]
fn explicit_version_argument() {
    let parsed = parse_get("ws.clean", Some("v3")).expect("explicit version parses");
    assert_eq!(parsed.version, Some(VersionRef::Tag(3)));

    assert_eq!(
        parse_get("ws.clean@v3", Some("v4")).unwrap_err(),
        ParseError::DuplicateVersion
    );
}

#[test]
fn get_rejects_globs() {
    assert_eq!(
        parse_get("ws.rev*", None).unwrap_err(),
        ParseError::InvalidName { ch: '*' }
    );
    assert_eq!(
        parse_get("ws.reviews@3f*", None).unwrap_err(),
        ParseError::PatternNotAllowed
    );
}

#[test]
fn list_allows_globs() {
    let parsed = parse_list("ws.rev*@3f*").expect("glob identifier parses");
    assert_eq!(parsed.name, "rev*");
    assert_eq!(parsed.version, Some(VersionRef::Pattern("3f*".to_string())));

    // A trailing bracket group that is not a split keyword stays in the
    // name pattern as a glob class.
    let parsed = parse_list("data[12]").expect("glob class parses");
    assert_eq!(parsed.name, "data[12]");
    assert_eq!(parsed.split, None);

    let parsed = parse_list("data*[train]").expect("glob with split parses");
    assert_eq!(parsed.name, "data*");
    assert_eq!(parsed.split, Some(Split::Train));
}

#[test]
fn malformed_identifiers() {
    assert_eq!(parse_get("", None).unwrap_err(), ParseError::Empty);
    assert_eq!(parse_get("   ", None).unwrap_err(), ParseError::Empty);
    assert_eq!(parse_get(".name", None).unwrap_err(), ParseError::MissingName);
    assert_eq!(parse_get("ws.", None).unwrap_err(), ParseError::MissingName);
    assert_eq!(parse_get("ws.name@", None).unwrap_err(), ParseError::EmptyVersion);
    assert_eq!(
        parse_get("ws.name@vNext", None).unwrap_err(),
        ParseError::InvalidVersion {
            token: "vNext".to_string()
        }
    );
    assert_eq!(
        parse_get("bad ws.name", None).unwrap_err(),
        ParseError::InvalidWorkspace { ch: ' ' }
    );
}
