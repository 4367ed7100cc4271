//! WebSocket エコーサーバーの例 (tokio)
//!
//! 使い方:
//!   # エコーサーバー (ポート 8080)
//!   cargo run -p websock_echo_server
//!
//! 接続テスト:
//!   websocat ws://localhost:8080/

use shiguredo_websock::{
    FeedProgress, FrameDecoder, Opcode, RequestDecoder, encode_frame, handshake,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

struct ServerOptions {
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = parse_args()?;

    let addr = format!("0.0.0.0:{}", options.port);
    let listener = TcpListener::bind(&addr).await?;

    println!("WebSocket echo server listening on ws://{}", addr);

    loop {
        let (stream, peer_addr) = listener.accept().await?;

        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, peer_addr).await {
                eprintln!("Client error: {}", e);
            }
        });
    }
}

fn parse_args() -> Result<ServerOptions, Box<dyn std::error::Error>> {
    let mut args = noargs::raw_args();
    args.metadata_mut().app_name = "websock_echo_server";

    // --help フラグ
    noargs::HELP_FLAG.take_help(&mut args);

    // --version フラグ
    let version_flag: bool = noargs::flag("version")
        .short('V')
        .doc("Show version")
        .take(&mut args)
        .is_present();
    if version_flag {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    // --port オプション
    let port: u16 = noargs::opt("port")
        .short('p')
        .doc("Port to listen on (default: 8080)")
        .default("8080")
        .take(&mut args)
        .then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;

    // 未知の引数があればエラー、ヘルプが返されたら表示
    if let Some(help) = args.finish().map_err(|e| format!("{:?}", e))? {
        print!("{}", help);
        std::process::exit(0);
    }

    Ok(ServerOptions { port })
}

async fn handle_client(
    mut stream: TcpStream,
    peer_addr: std::net::SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    println!("Connection from {}", peer_addr);

    // ハンドシェイク: HTTP リクエストを受信して 101 を返す
    let mut decoder = RequestDecoder::new();
    let mut buf = [0u8; 4096];
    let mut stragglers = Vec::new();

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            println!("Connection closed by {} before handshake", peer_addr);
            return Ok(());
        }
        if let FeedProgress::Complete { consumed } = decoder.feed(&buf[..n])? {
            // リクエスト完了後の余りは最初のフレームの先頭
            stragglers.extend_from_slice(&buf[consumed..n]);
            break;
        }
    }

    let response = {
        let request = decoder
            .request()
            .ok_or("request accessor returned none after completion")?;
        handshake::build_handshake_response(&request, None)?
    };
    stream.write_all(response.as_bytes()).await?;
    println!("Handshake complete with {}", peer_addr);

    // フレームループ: Text / Bin はエコー、Ping は Pong、Close で終了
    let mut decoder = FrameDecoder::new();
    let mut pending = stragglers;

    loop {
        let mut offset = 0;
        while offset < pending.len() {
            match decoder.feed(&pending[offset..])? {
                FeedProgress::NeedMore => {
                    offset = pending.len();
                }
                FeedProgress::Complete { consumed } => {
                    offset += consumed;
                    let reply = {
                        let frame = decoder
                            .frame()
                            .ok_or("frame accessor returned none after completion")?;
                        match frame.opcode() {
                            Opcode::Text | Opcode::Bin => {
                                Some(encode_frame(true, frame.opcode(), frame.payload())?)
                            }
                            Opcode::Ping => {
                                Some(encode_frame(true, Opcode::Pong, frame.payload())?)
                            }
                            Opcode::Pong | Opcode::Cont => None,
                            Opcode::Close => {
                                let close = encode_frame(true, Opcode::Close, frame.payload())?;
                                stream.write_all(&close).await?;
                                println!("Close from {}", peer_addr);
                                return Ok(());
                            }
                        }
                    };
                    if let Some(reply) = reply {
                        stream.write_all(&reply).await?;
                    }
                }
            }
        }
        pending.clear();

        let n = stream.read(&mut buf).await?;
        if n == 0 {
            println!("Connection closed by {}", peer_addr);
            return Ok(());
        }
        pending.extend_from_slice(&buf[..n]);
    }
}
