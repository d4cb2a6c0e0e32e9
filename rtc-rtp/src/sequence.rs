/// Sequencer generates sequential sequence numbers for building RTP packets
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    sequence_number: u16,
    roll_over_count: u64,
}

impl Sequencer {
    /// Returns a new sequencer starting from a random sequence number
    pub fn new_random() -> Self {
        Self::new_fixed(rand::random::<u16>())
    }

    /// Returns a new sequencer starting from a specific sequence number
    pub fn new_fixed(starting_seq: u16) -> Self {
        Sequencer {
            sequence_number: starting_seq.wrapping_sub(1),
            roll_over_count: 0,
        }
    }

    /// Increments and returns a new sequence number for building RTP packets
    pub fn next_sequence_number(&mut self) -> u16 {
        self.sequence_number = self.sequence_number.wrapping_add(1);
        if self.sequence_number == 0 {
            self.roll_over_count += 1;
        }
        self.sequence_number
    }

    /// Returns the amount of times the 16bit sequence number has wrapped
    pub fn roll_over_count(&self) -> u64 {
        self.roll_over_count
    }
}
