use super::*;
use std::str::FromStr;

#[test]
fn enum_roundtrips() {
    assert_eq!(UserRole::try_from(1).expect("valid user role"), UserRole::Admin);
    assert_eq!(UserRole::Sales.as_i32(), 3);
    assert_eq!(
        MemberRole::try_from(1).expect("valid member role"),
        MemberRole::Leader
    );
    assert_eq!(MemberRole::Member.as_i32(), 2);
    assert_eq!(
        MemberRole::from_str("member").expect("parse member role"),
        MemberRole::Member
    );
    assert_eq!(
        UserRole::from_str(" manager ").expect("parse user role"),
        UserRole::Manager
    );
}

#[test]
fn enum_parse_invalid() {
    assert!(UserRole::try_from(99).is_err());
    assert!(MemberRole::try_from(0).is_err());
    let err = MemberRole::from_str("owner").expect_err("unknown role");
    assert_eq!(err.to_string(), "invalid member_role value: owner");
}

#[test]
fn member_role_serializes_upper_case() {
    let json = serde_json::to_string(&MemberRole::Leader).expect("serialize");
    assert_eq!(json, "\"LEADER\"");
    let role: MemberRole = serde_json::from_str("\"MEMBER\"").expect("deserialize");
    assert_eq!(role, MemberRole::Member);
}
