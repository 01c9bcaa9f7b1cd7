use tagcompare_lib::{KeyDimension, KeyError, TagCompareError};

#[test]
fn config_error_display_includes_message() {
    let err = TagCompareError::Config("missing comparisons".to_string());

    assert_eq!(format!("{}", err), "Configuration error: missing comparisons");
}

#[test]
fn io_error_display_wraps_source() {
    let io_err = std::io::Error::other("disk full");
    let err: TagCompareError = io_err.into();
    let rendered = format!("{}", err);

    assert!(rendered.starts_with("IO error: "));
    assert!(rendered.contains("disk full"));
}

#[test]
fn key_errors_name_the_missing_dimension() {
    let err: TagCompareError = KeyError::MissingDimension {
        dimension: KeyDimension::CampaignId,
    }
    .into();

    assert_eq!(
        format!("{}", err),
        "Artifact key error: Key dimension 'campaign_id' is not set"
    );
}

#[test]
fn precondition_helper_uses_message() {
    let err = TagCompareError::precondition("need two configs");

    assert_eq!(format!("{}", err), "Precondition failed: need two configs");
}

#[test]
fn campaign_helper_uses_message() {
    let err = TagCompareError::campaign("unknown publisher id '1'");

    assert_eq!(
        format!("{}", err),
        "Campaign lookup error: unknown publisher id '1'"
    );
}
