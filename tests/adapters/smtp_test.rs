//! SMTP adapter tests against an in-process fake server.

use std::time::Duration;

use courier::providers::SmtpMailer;
use courier::{Email, MailConfig, MailError, Mailer};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Accept one SMTP session, answer every command with success and hand back
/// the DATA payload.
async fn fake_smtp_server() -> (u16, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        let mut data = String::new();
        let mut in_data = false;

        write.write_all(b"220 fake ESMTP\r\n").await.unwrap();

        while let Ok(Some(line)) = lines.next_line().await {
            if in_data {
                if line == "." {
                    in_data = false;
                    write
                        .write_all(b"250 2.0.0 Ok: queued as FAKE123\r\n")
                        .await
                        .unwrap();
                } else {
                    data.push_str(&line);
                    data.push('\n');
                }
                continue;
            }

            let command = line.to_ascii_uppercase();
            let reply: &[u8] = if command.starts_with("EHLO") {
                b"250-fake\r\n250 8BITMIME\r\n"
            } else if command.starts_with("DATA") {
                in_data = true;
                b"354 End data with <CR><LF>.<CR><LF>\r\n"
            } else if command.starts_with("QUIT") {
                write.write_all(b"221 Bye\r\n").await.unwrap();
                break;
            } else {
                b"250 Ok\r\n"
            };
            write.write_all(reply).await.unwrap();
        }

        let _ = tx.send(data);
    });

    (port, rx)
}

#[tokio::test]
async fn delivers_through_plain_smtp() {
    let (port, received) = fake_smtp_server().await;

    let config = MailConfig {
        port,
        debug: true,
        timeout_ms: Some(5_000),
        ..MailConfig::smtp("127.0.0.1")
    };
    let mailer = SmtpMailer::from_config(&config).unwrap();

    let email = Email::new()
        .from("sender@example.com")
        .to("recipient@example.com")
        .subject("Over the wire")
        .text_body("Hello from the test");

    let result = mailer.deliver(&email).await.unwrap();
    assert!(result.message_id.ends_with("@example.com>"));

    let response = result.provider_response.unwrap();
    assert_eq!(response["code"], "250");

    let payload = tokio::time::timeout(Duration::from_secs(5), received)
        .await
        .unwrap()
        .unwrap();
    assert!(payload.contains("Subject: Over the wire"));
    assert!(payload.contains(&result.message_id));
    assert!(payload.contains("Hello from the test"));
}

#[tokio::test]
async fn user_without_password_sends_without_auth() {
    // The fake server advertises no AUTH mechanism, so any AUTH attempt
    // would fail the send.
    let (port, received) = fake_smtp_server().await;

    let config = MailConfig {
        port,
        username: Some("mailer".into()),
        timeout_ms: Some(5_000),
        ..MailConfig::smtp("127.0.0.1")
    };
    let mailer = SmtpMailer::from_config(&config).unwrap();

    let email = Email::new()
        .from("sender@example.com")
        .to("recipient@example.com")
        .subject("No auth");
    mailer.deliver(&email).await.unwrap();

    let payload = tokio::time::timeout(Duration::from_secs(5), received)
        .await
        .unwrap()
        .unwrap();
    assert!(payload.contains("Subject: No auth"));
}

#[tokio::test]
async fn connection_refused_keeps_lettre_error() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = MailConfig {
        port,
        connect_timeout_ms: Some(1_000),
        ..MailConfig::smtp("127.0.0.1")
    };
    let mailer = SmtpMailer::from_config(&config).unwrap();

    let email = Email::new().from("a@example.com").to("b@example.com");
    let err = mailer.deliver(&email).await.unwrap_err();
    assert!(matches!(err, MailError::Transport(_)));

    let source = std::error::Error::source(&err).expect("lettre error kept as source");
    assert!(!source.to_string().is_empty());
    let transport = err.transport_error().expect("transport error");
    assert!(!transport.is_permanent());
}

#[tokio::test]
async fn missing_sender_fails_before_connecting() {
    let mailer = SmtpMailer::new("127.0.0.1", 9).build().unwrap();
    let err = mailer
        .deliver(&Email::new().to("b@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, MailError::MissingField("from")));
}
