use stun::attributes::*;
use stun::message::*;

use super::control::*;
use super::priority::*;
use super::use_candidate::*;
use shared::error::*;

#[test]
fn test_controlled_get_from() -> Result<()> {
    let mut m = Message::new();
    let mut c = AttrControlled(4321);
    let result = c.get_from(&m);
    assert_eq!(result, Err(Error::ErrAttributeNotFound), "should error");

    m.build(&[Box::new(BINDING_REQUEST), Box::new(c)])?;

    let mut m1 = Message::new();
    m1.unmarshal_binary(&m.raw)?;

    let mut c1 = AttrControlled::default();
    c1.get_from(&m1)?;

    assert_eq!(c1, c, "not equal");

    //"IncorrectSize"
    {
        let mut m3 = Message::new();
        m3.add(ATTR_ICE_CONTROLLED, &[0; 100]);
        let mut c2 = AttrControlled::default();
        let result = c2.get_from(&m3);
        assert!(result.is_err(), "should error");
    }

    Ok(())
}

#[test]
fn test_controlling_get_from() -> Result<()> {
    let mut m = Message::new();
    let mut c = AttrControlling(4321);
    let result = c.get_from(&m);
    assert_eq!(result, Err(Error::ErrAttributeNotFound), "should error");

    m.build(&[Box::new(BINDING_REQUEST), Box::new(c)])?;

    let mut m1 = Message::new();
    m1.unmarshal_binary(&m.raw)?;

    let mut c1 = AttrControlling::default();
    c1.get_from(&m1)?;

    assert_eq!(c1, c, "not equal");

    Ok(())
}

#[test]
fn test_control_get_from() -> Result<()> {
    //"Blank"
    {
        let m = Message::new();
        let mut c = AttrControl::default();
        let result = c.get_from(&m);
        assert_eq!(result, Err(Error::ErrAttributeNotFound), "should error");
    }
    //"Controlling"
    {
        let mut m = Message::new();
        let mut c = AttrControl::default();
        c.role = Role::Controlling;
        c.tie_breaker = TieBreaker(4321);
        m.build(&[Box::new(BINDING_REQUEST), Box::new(c)])?;

        let mut m1 = Message::new();
        m1.unmarshal_binary(&m.raw)?;

        let mut c1 = AttrControl::default();
        c1.get_from(&m1)?;
        assert_eq!(c1, c, "not equal");
    }
    //"Controlled"
    {
        let mut m = Message::new();
        let c = AttrControl {
            role: Role::Controlled,
            tie_breaker: TieBreaker(1234),
        };
        m.build(&[Box::new(BINDING_REQUEST), Box::new(c)])?;

        let mut m1 = Message::new();
        m1.unmarshal_binary(&m.raw)?;

        let mut c1 = AttrControl::default();
        c1.get_from(&m1)?;
        assert_eq!(c1, c, "not equal");
    }

    Ok(())
}

#[test]
fn test_priority_get_from() -> Result<()> {
    let mut m = Message::new();
    let mut p = PriorityAttr::default();
    let result = p.get_from(&m);
    assert_eq!(result, Err(Error::ErrAttributeNotFound), "should error");

    m.build(&[Box::new(BINDING_REQUEST), Box::new(PriorityAttr(2130706431))])?;

    let mut m1 = Message::new();
    m1.unmarshal_binary(&m.raw)?;

    p.get_from(&m1)?;
    assert_eq!(p, PriorityAttr(2130706431), "not equal");

    //"IncorrectSize"
    {
        let mut m3 = Message::new();
        m3.add(ATTR_PRIORITY, &[0; 100]);
        let mut p2 = PriorityAttr::default();
        assert!(p2.get_from(&m3).is_err(), "should error");
    }

    Ok(())
}

#[test]
fn test_use_candidate_attr_add_to() -> Result<()> {
    let mut m = Message::new();
    assert!(!UseCandidateAttr::is_set(&m), "should not be set");

    m.build(&[Box::new(BINDING_REQUEST), Box::new(UseCandidateAttr::new())])?;

    let mut m1 = Message::new();
    m1.unmarshal_binary(&m.raw)?;

    assert!(UseCandidateAttr::is_set(&m1), "should be set");

    Ok(())
}

#[test]
fn test_role_string() -> Result<()> {
    assert_eq!(Role::from("controlling"), Role::Controlling);
    assert_eq!(Role::from("controlled"), Role::Controlled);
    assert_eq!(Role::from("foo"), Role::Unspecified);
    assert_eq!(Role::Controlled.to_string(), "controlled");

    Ok(())
}
