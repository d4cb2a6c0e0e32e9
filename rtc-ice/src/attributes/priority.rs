use stun::attributes::ATTR_PRIORITY;
use stun::checks::*;
use stun::message::*;

use shared::error::*;

/// Represents PRIORITY attribute.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct PriorityAttr(pub u32);

const PRIORITY_SIZE: usize = 4; // 32 bit

impl Setter for PriorityAttr {
    // add_to adds PRIORITY attribute to message.
    fn add_to(&self, m: &mut Message) -> Result<()> {
        m.add(ATTR_PRIORITY, &self.0.to_be_bytes());
        Ok(())
    }
}

impl Getter for PriorityAttr {
    // get_from decodes PRIORITY attribute from message.
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let v = m.get(ATTR_PRIORITY)?;

        check_size(ATTR_PRIORITY, v.len(), PRIORITY_SIZE)?;

        let mut b = [0u8; PRIORITY_SIZE];
        b.copy_from_slice(&v);
        self.0 = u32::from_be_bytes(b);

        Ok(())
    }
}
