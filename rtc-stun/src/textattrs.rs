use std::fmt;

use shared::error::*;

use crate::attributes::*;
use crate::checks::*;
use crate::message::*;

const MAX_USERNAME_B: usize = 513;
const MAX_REALM_B: usize = 763;
const MAX_SOFTWARE_B: usize = 763;
const MAX_NONCE_B: usize = 763;

// Username represents USERNAME attribute.
//
// RFC 5389 Section 15.3
pub type Username = TextAttribute;

// Realm represents REALM attribute.
//
// RFC 5389 Section 15.7
pub type Realm = TextAttribute;

// Nonce represents NONCE attribute.
//
// RFC 5389 Section 15.8
pub type Nonce = TextAttribute;

// Software is SOFTWARE attribute.
//
// RFC 5389 Section 15.10
pub type Software = TextAttribute;

// TextAttribute is helper for adding and getting text attributes.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct TextAttribute {
    pub attr: AttrType,
    pub text: String,
}

impl fmt::Display for TextAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl Setter for TextAttribute {
    // add_to adds attribute with type t to m, checking maximum length. If max_len
    // is less than 0, no check is performed.
    fn add_to(&self, m: &mut Message) -> Result<()> {
        let text = self.text.as_bytes();
        let max_len = match self.attr {
            ATTR_USERNAME => MAX_USERNAME_B,
            ATTR_REALM => MAX_REALM_B,
            ATTR_SOFTWARE => MAX_SOFTWARE_B,
            ATTR_NONCE => MAX_NONCE_B,
            _ => return Err(Error::Other(format!("Unsupported AttrType {}", self.attr))),
        };

        check_overflow(self.attr, text.len(), max_len)?;
        m.add(self.attr, text);
        Ok(())
    }
}

impl Getter for TextAttribute {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let attr = self.attr;
        *self = TextAttribute::get_from_as(m, attr)?;
        Ok(())
    }
}

impl TextAttribute {
    pub fn new(attr: AttrType, text: String) -> Self {
        TextAttribute { attr, text }
    }

    // get_from_as gets t attribute from m and appends its value to reseted v.
    pub fn get_from_as(m: &Message, attr: AttrType) -> Result<Self> {
        match attr {
            ATTR_USERNAME | ATTR_REALM | ATTR_SOFTWARE | ATTR_NONCE => {}
            _ => return Err(Error::Other(format!("Unsupported AttrType {attr}"))),
        };

        let a = m.get(attr)?;
        let text = String::from_utf8(a)?;
        Ok(TextAttribute { attr, text })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_username_round_trip() -> Result<()> {
        let username = "username".to_owned();
        let u = Username::new(ATTR_USERNAME, username.clone());
        let mut m = Message::new();
        m.write_header();
        u.add_to(&mut m)?;
        assert_eq!(u.to_string(), username);

        let mut m2 = Message::new();
        m2.raw.extend_from_slice(&m.raw);
        m2.decode()?;
        let got = Username::get_from_as(&m2, ATTR_USERNAME)?;
        assert_eq!(got.text, username);

        Ok(())
    }

    #[test]
    fn test_username_overflow() -> Result<()> {
        let mut m = Message::new();
        m.write_header();
        let u = Username::new(ATTR_USERNAME, "a".repeat(600));
        let result = u.add_to(&mut m);
        assert!(result.is_err(), "should error");
        if let Err(err) = result {
            assert!(is_attr_size_overflow(&err), "should be overflow");
        }

        Ok(())
    }

    #[test]
    fn test_text_attribute_absent() -> Result<()> {
        let mut m = Message::new();
        m.write_header();
        let result = TextAttribute::get_from_as(&m, ATTR_NONCE);
        assert_eq!(result, Err(Error::ErrAttributeNotFound));

        Ok(())
    }

    #[test]
    fn test_text_attribute_unsupported() -> Result<()> {
        let m = Message::new();
        assert!(TextAttribute::get_from_as(&m, ATTR_DATA).is_err());

        Ok(())
    }
}
