use bytes::BytesMut;
use clap::Parser;
use log::{info, trace};
use rtc::data_channel::RTCDataChannelId;
use rtc::peer_connection::RTCPeerConnection;
use rtc::peer_connection::configuration::RTCConfigurationBuilder;
use rtc::peer_connection::event::RTCPeerConnectionEvent;
use rtc::peer_connection::event::data_channel_event::RTCDataChannelEvent;
use rtc::peer_connection::message::RTCMessage;
use rtc::peer_connection::state::RTCPeerConnectionState;
use rtc::peer_connection::transport::RTCIceServer;
use rtc::sansio::Protocol;
use rtc::shared::{TaggedBytesMut, TransportContext, TransportProtocol};
use rtc::signaling::SignalingMessage;
use std::io::Write;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;

// Run the answering side first, then paste the printed lines across:
// RUST_LOG=debug cargo run --package rtc --example data_channels_udp -- --debug
// RUST_LOG=debug cargo run --package rtc --example data_channels_udp -- --offer --debug

#[derive(Parser)]
#[command(name = "Data Channels UDP")]
#[command(version = "0.1.0")]
#[command(about = "Connects two peers over UDP and exchanges data channel messages", long_about = None)]
struct Cli {
    /// create the offer and the data channel
    #[arg(long)]
    offer: bool,
    #[arg(long, default_value_t = format!("127.0.0.1:0"))]
    address: String,
    #[arg(long)]
    stun: Option<String>,

    #[arg(short, long)]
    debug: bool,
    #[arg(long, default_value_t = format!("INFO"))]
    log_level: String,
}

async fn read_signaling(
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
) -> anyhow::Result<SignalingMessage> {
    loop {
        let line = lines
            .next_line()
            .await?
            .ok_or_else(|| anyhow::anyhow!("stdin closed"))?;
        if !line.trim().is_empty() {
            return Ok(SignalingMessage::from_json(line.trim())?);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.debug {
        let log_level = log::LevelFilter::from_str(&cli.log_level).unwrap_or(log::LevelFilter::Info);
        env_logger::Builder::new()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{}:{} [{}] {} - {}",
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.level(),
                    chrono::Local::now().format("%H:%M:%S.%6f"),
                    record.args()
                )
            })
            .filter(None, log_level)
            .init();
    }

    let socket = UdpSocket::bind(&cli.address).await?;
    let local_addr = socket.local_addr()?;
    println!("listening on {local_addr}");

    let mut builder = RTCConfigurationBuilder::new();
    if let Some(stun) = cli.stun {
        builder = builder.with_ice_servers(vec![RTCIceServer {
            urls: vec![stun],
            ..Default::default()
        }]);
    }
    let mut pc = RTCPeerConnection::new(builder.build())?;
    pc.add_local_address(local_addr, TransportProtocol::UDP)?;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut channel: Option<RTCDataChannelId> = None;
    if cli.offer {
        pc.create_data_channel("data", None)?;
        let offer = pc.create_offer(None)?;
        pc.set_local_description(offer.clone())?;
        println!("paste this offer into the answering side:");
        println!("{}", SignalingMessage::try_from(&offer)?.to_json()?);

        println!("paste the answer:");
        let answer = read_signaling(&mut stdin).await?;
        pc.set_remote_description(answer.to_description()?)?;
    } else {
        println!("paste the offer:");
        let offer = read_signaling(&mut stdin).await?;
        pc.set_remote_description(offer.to_description()?)?;

        let answer = pc.create_answer(None)?;
        pc.set_local_description(answer.clone())?;
        println!("paste this answer into the offering side:");
        println!("{}", SignalingMessage::try_from(&answer)?.to_json()?);
    }

    println!("Press Ctrl-C to stop");
    let mut buf = vec![0u8; 2000];
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut sent = 0usize;

    loop {
        while let Some(msg) = pc.poll_write() {
            socket.send_to(&msg.message, msg.transport.peer_addr).await?;
            trace!("socket.sent {} to {}", msg.message.len(), msg.transport.peer_addr);
        }

        while let Some(event) = pc.poll_event() {
            match event {
                RTCPeerConnectionEvent::OnConnectionStateChangeEvent(state) => {
                    println!("connection state: {state}");
                    if state == RTCPeerConnectionState::Failed {
                        pc.close()?;
                        return Ok(());
                    }
                }
                RTCPeerConnectionEvent::OnDataChannel(RTCDataChannelEvent::OnOpen(id))
                | RTCPeerConnectionEvent::OnDataChannel(RTCDataChannelEvent::OnDataChannel(id)) => {
                    info!("data channel {id} ready");
                    channel = Some(id);
                }
                RTCPeerConnectionEvent::OnDataChannel(RTCDataChannelEvent::OnClose(id)) => {
                    println!("data channel {id} closed");
                    if channel == Some(id) {
                        channel = None;
                    }
                }
                _ => {}
            }
        }

        while let Some(message) = pc.poll_read() {
            if let RTCMessage::DataChannelMessage(id, msg) = message {
                println!(
                    "channel {id} received: {}",
                    String::from_utf8_lossy(&msg.data)
                );
            }
        }

        let timeout = pc
            .poll_timeout()
            .unwrap_or(Instant::now() + Duration::from_secs(1));
        let delay = timeout.saturating_duration_since(Instant::now());
        if delay.is_zero() {
            pc.handle_timeout(Instant::now())?;
            continue;
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                pc.handle_timeout(Instant::now())?;
            }
            _ = ticker.tick() => {
                if let Some(id) = channel
                    && let Some(mut dc) = pc.data_channel(id)
                {
                    sent += 1;
                    dc.send(BytesMut::from(format!("message #{sent} from {local_addr}").as_str()))?;
                }
                if let Ok(json) = pc.get_stats(Instant::now()).to_json() {
                    trace!("stats: {json}");
                }
            }
            Ok((n, peer_addr)) = socket.recv_from(&mut buf) => {
                pc.handle_read(TaggedBytesMut {
                    now: Instant::now(),
                    transport: TransportContext {
                        local_addr,
                        peer_addr,
                        transport_protocol: TransportProtocol::UDP,
                    },
                    message: BytesMut::from(&buf[..n]),
                })?;
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    pc.close()?;
    while let Some(msg) = pc.poll_write() {
        socket.send_to(&msg.message, msg.transport.peer_addr).await?;
    }
    Ok(())
}
