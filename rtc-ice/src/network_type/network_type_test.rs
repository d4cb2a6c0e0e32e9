use super::*;

#[test]
fn test_network_type_parsing_success() -> Result<()> {
    let ipv4: IpAddr = "192.168.0.1".parse()?;
    let ipv6: IpAddr = "fe80::a3:6ff:fec4:5454".parse()?;

    let tests = vec![
        ("lowercase UDP4", "udp", ipv4, NetworkType::Udp4),
        ("uppercase UDP4", "UDP", ipv4, NetworkType::Udp4),
        ("lowercase UDP6", "udp", ipv6, NetworkType::Udp6),
        ("uppercase UDP6", "UDP", ipv6, NetworkType::Udp6),
        ("lowercase TCP4", "tcp", ipv4, NetworkType::Tcp4),
        ("uppercase TCP6", "TCP", ipv6, NetworkType::Tcp6),
    ];

    for (name, in_network, in_ip, expected) in tests {
        let actual = determine_network_type(in_network, &in_ip)?;

        assert_eq!(
            actual, expected,
            "NetworkTypeParsing: '{name}' -- input:{in_network} expected:{expected} actual:{actual}"
        );
    }

    Ok(())
}

#[test]
fn test_network_type_parsing_failure() -> Result<()> {
    let ipv6: IpAddr = "fe80::a3:6ff:fec4:5454".parse()?;

    let tests = vec![("invalid network", "junkNetwork", ipv6)];
    for (name, in_network, in_ip) in tests {
        let result = determine_network_type(in_network, &in_ip);
        assert!(
            result.is_err(),
            "NetworkTypeParsing should fail: '{name}' -- input:{in_network}",
        );
    }

    Ok(())
}

#[test]
fn test_network_type_is_udp() -> Result<()> {
    assert!(NetworkType::Udp4.is_udp());
    assert!(NetworkType::Udp6.is_udp());
    assert!(!NetworkType::Udp4.is_tcp());
    assert!(!NetworkType::Udp6.is_tcp());

    Ok(())
}

#[test]
fn test_network_type_is_tcp() -> Result<()> {
    assert!(NetworkType::Tcp4.is_tcp());
    assert!(NetworkType::Tcp6.is_tcp());
    assert!(!NetworkType::Tcp4.is_udp());
    assert!(!NetworkType::Tcp6.is_udp());
    assert!(NetworkType::Tcp4.is_reliable());

    Ok(())
}

#[test]
fn test_network_type_of_local_address() -> Result<()> {
    let ipv4: IpAddr = "10.0.0.1".parse()?;
    let ipv6: IpAddr = "::1".parse()?;

    assert_eq!(
        network_type_of(TransportProtocol::UDP, &ipv4),
        NetworkType::Udp4
    );
    assert_eq!(
        network_type_of(TransportProtocol::TCP, &ipv6),
        NetworkType::Tcp6
    );
    assert_eq!(
        NetworkType::Tcp6.transport_protocol(),
        TransportProtocol::TCP
    );

    Ok(())
}
