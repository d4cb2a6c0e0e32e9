use super::*;
use crate::fingerprint::FINGERPRINT;
use crate::integrity::MessageIntegrity;
use crate::textattrs::TextAttribute;
use crate::xoraddr::XorMappedAddress;

#[test]
fn test_message_type_value() -> Result<()> {
    let tests = vec![
        (
            MessageType {
                method: METHOD_BINDING,
                class: CLASS_REQUEST,
            },
            0x0001,
        ),
        (
            MessageType {
                method: METHOD_BINDING,
                class: CLASS_SUCCESS_RESPONSE,
            },
            0x0101,
        ),
        (
            MessageType {
                method: METHOD_BINDING,
                class: CLASS_ERROR_RESPONSE,
            },
            0x0111,
        ),
        (
            MessageType {
                method: Method(0xb6d),
                class: MessageClass(0x3),
            },
            0x2ddd,
        ),
    ];

    for (input, output) in tests {
        let b = input.value();
        assert_eq!(b, output, "Value({input}) -> {b}, want {output}");
    }

    Ok(())
}

#[test]
fn test_message_type_read_value() -> Result<()> {
    let tests = vec![
        (
            0x0001,
            MessageType {
                method: METHOD_BINDING,
                class: CLASS_REQUEST,
            },
        ),
        (
            0x0101,
            MessageType {
                method: METHOD_BINDING,
                class: CLASS_SUCCESS_RESPONSE,
            },
        ),
        (
            0x0111,
            MessageType {
                method: METHOD_BINDING,
                class: CLASS_ERROR_RESPONSE,
            },
        ),
    ];

    for (input, output) in tests {
        let mut m = MessageType::default();
        m.read_value(input);
        assert_eq!(m, output, "ReadValue({input})");
    }

    Ok(())
}

#[test]
fn test_message_type_read_write_value() -> Result<()> {
    let tests = vec![
        BINDING_REQUEST,
        BINDING_SUCCESS,
        BINDING_ERROR,
        MessageType::new(METHOD_ALLOCATE, CLASS_REQUEST),
        MessageType::new(METHOD_CREATE_PERMISSION, CLASS_SUCCESS_RESPONSE),
        MessageType::new(METHOD_DATA, CLASS_INDICATION),
        MessageType {
            method: Method(0x12),
            class: CLASS_ERROR_RESPONSE,
        },
    ];

    for test in tests {
        let mut m = MessageType::default();
        let v = test.value();
        m.read_value(v);
        assert_eq!(m, test, "ReadValue({test} -> {v}) = {m}, should be {test}");
    }

    Ok(())
}

#[test]
fn test_message_build_and_decode() -> Result<()> {
    let mut m = Message::new();
    m.build(&[
        Box::new(BINDING_REQUEST),
        Box::new(TransactionId::new()),
        Box::new(TextAttribute::new(ATTR_SOFTWARE, "rtc".to_owned())),
        Box::new(MessageIntegrity::new_short_term_integrity("pwd".to_owned())),
        Box::new(FINGERPRINT),
    ])?;

    assert!(is_message(&m.raw));

    let mut decoded = Message::new();
    decoded.unmarshal_binary(&m.marshal_binary())?;
    assert_eq!(decoded, m);
    assert_eq!(decoded.typ, BINDING_REQUEST);
    assert!(decoded.contains(ATTR_MESSAGE_INTEGRITY));
    assert!(decoded.contains(ATTR_FINGERPRINT));
    assert!(!decoded.contains(ATTR_USERNAME));
    assert_eq!(decoded.get(ATTR_SOFTWARE)?, b"rtc".to_vec());

    FINGERPRINT.check(&decoded)?;
    MessageIntegrity::new_short_term_integrity("pwd".to_owned()).check(&mut decoded)?;
    let result =
        MessageIntegrity::new_short_term_integrity("other".to_owned()).check(&mut decoded);
    assert_eq!(result, Err(Error::ErrIntegrityMismatch));

    Ok(())
}

#[test]
fn test_message_response_carries_transaction_id() -> Result<()> {
    let mut request = Message::new();
    request.build(&[Box::new(BINDING_REQUEST), Box::new(TransactionId::new())])?;

    let mut response = Message::new();
    response.build(&[
        Box::new(request.clone()),
        Box::new(BINDING_SUCCESS),
        Box::new(XorMappedAddress {
            ip: "10.0.0.1".parse()?,
            port: 4000,
        }),
    ])?;

    assert_eq!(response.transaction_id, request.transaction_id);
    let mut decoded = Message::new();
    decoded.unmarshal_binary(&response.raw)?;
    assert_eq!(decoded.transaction_id, request.transaction_id);

    let mut addr = XorMappedAddress::default();
    addr.get_from(&decoded)?;
    assert_eq!(addr.port, 4000);

    Ok(())
}

#[test]
fn test_message_attribute_padding() -> Result<()> {
    let mut m = Message::new();
    m.write_header();
    m.add(ATTR_USERNAME, &[1, 2, 3, 4, 5]);
    assert_eq!(m.length, 12, "5 bytes of value are padded to 8");
    assert_eq!(m.raw.len(), MESSAGE_HEADER_SIZE + 12);
    assert_eq!(&m.raw[MESSAGE_HEADER_SIZE + 9..], &[0, 0, 0]);

    let mut decoded = Message::new();
    decoded.unmarshal_binary(&m.raw)?;
    assert_eq!(decoded.get(ATTR_USERNAME)?, vec![1, 2, 3, 4, 5]);

    Ok(())
}

#[test]
fn test_message_decode_errors() -> Result<()> {
    let mut m = Message::new();
    assert_eq!(
        m.unmarshal_binary(&[0, 1, 0, 0]),
        Err(Error::ErrUnexpectedHeaderEof)
    );

    let mut good = Message::new();
    good.build(&[Box::new(BINDING_REQUEST), Box::new(TransactionId::new())])?;
    let mut bad_cookie = good.raw.clone();
    bad_cookie[4] = 0;
    assert_eq!(
        m.unmarshal_binary(&bad_cookie),
        Err(Error::ErrInvalidMagicCookie)
    );
    assert!(!is_message(&bad_cookie));

    // declared length larger than the buffer
    let mut truncated = good.raw.clone();
    truncated[3] = 8;
    assert!(m.unmarshal_binary(&truncated).is_err());

    Ok(())
}

#[test]
fn test_message_encode_rewrites_raw() -> Result<()> {
    let mut m = Message::new();
    m.typ = BINDING_INDICATION;
    m.transaction_id = TransactionId([7; TRANSACTION_ID_SIZE]);
    m.attributes.0.push(crate::attributes::RawAttribute {
        typ: ATTR_SOFTWARE,
        length: 2,
        value: vec![b'o', b'k'],
    });
    m.encode();

    let mut decoded = Message::new();
    decoded.unmarshal_binary(&m.raw)?;
    assert_eq!(decoded.typ, BINDING_INDICATION);
    assert_eq!(decoded.transaction_id, m.transaction_id);
    assert_eq!(decoded.get(ATTR_SOFTWARE)?, b"ok".to_vec());
    assert_eq!(
        decoded.to_string(),
        format!("Binding indication l=8 attrs=1 id={}", "07".repeat(12))
    );

    Ok(())
}
