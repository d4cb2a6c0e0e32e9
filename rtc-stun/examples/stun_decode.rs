use base64::prelude::*;
use clap::Parser;

use rtc_stun::attributes::*;
use rtc_stun::error_code::ErrorCodeAttribute;
use rtc_stun::fingerprint::FINGERPRINT;
use rtc_stun::message::{Getter, Message};
use rtc_stun::textattrs::TextAttribute;
use rtc_stun::xoraddr::XorMappedAddress;

#[derive(Parser)]
#[command(name = "STUN decode")]
#[command(version = "0.1.0")]
#[command(about = "Decodes a base64 STUN message and prints its attributes", long_about = None)]
struct Cli {
    /// base64 encoded message, e.g. 'AAEAHCESpEJML0JTQWsyVXkwcmGALwAWaHR0cDovL2xvY2FsaG9zdDozMDAwLwAA'
    #[arg(long)]
    data: String,
}

fn main() {
    let cli = Cli::parse();

    let decoded_data = match BASE64_STANDARD.decode(cli.data) {
        Ok(d) => d,
        Err(e) => panic!("Unable to decode base64 value: {e}"),
    };

    let mut message = Message::new();
    if let Err(e) = message.unmarshal_binary(&decoded_data) {
        panic!("Unable to decode message: {e}");
    }
    println!("{message}");

    for attr in &message.attributes.0 {
        println!("  {attr}");
    }

    for t in [ATTR_USERNAME, ATTR_REALM, ATTR_NONCE, ATTR_SOFTWARE] {
        if let Ok(text) = TextAttribute::get_from_as(&message, t) {
            println!("{t}: {text}");
        }
    }

    let mut addr = XorMappedAddress::default();
    if addr.get_from(&message).is_ok() {
        println!("{ATTR_XORMAPPED_ADDRESS}: {addr}");
    }

    let mut code = ErrorCodeAttribute::default();
    if code.get_from(&message).is_ok() {
        println!("{ATTR_ERROR_CODE}: {code}");
    }

    if message.contains(ATTR_FINGERPRINT) {
        match FINGERPRINT.check(&message) {
            Ok(()) => println!("fingerprint ok"),
            Err(e) => println!("fingerprint invalid: {e}"),
        }
    }
}
