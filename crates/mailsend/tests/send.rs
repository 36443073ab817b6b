//! End-to-end delivery against a scripted server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::time::Duration;

use common::{Behaviour, Server, init_tracing};
use mailsend::{Config, Error, Mail, Mailer, Stage};
use mailsend_mime::Message;
use tokio::net::TcpListener;

const AUTH_ME: &str = "AUTH PLAIN AG1lQHguY29tAHNlY3JldA==";

fn mail() -> Mail {
    Mail::new("Me <me@x.com>")
        .to("a@x.com")
        .cc("b@x.com")
        .bcc("c@x.com")
        .subject("Grüße")
        .body("<p>héllo</p>\n.hidden\n")
}

fn delivered(data: Option<Vec<u8>>) -> Message {
    Message::parse(&data.expect("no DATA received")).unwrap()
}

#[tokio::test]
async fn direct_send_authenticates_on_loopback() {
    init_tracing();
    let server = Server::start(Behaviour {
        auth: true,
        ..Behaviour::default()
    })
    .await;

    mailsend::send(&server.addr(), "secret", &mail())
        .await
        .unwrap();

    let transcript = server.finish().await;
    assert_eq!(
        transcript.commands,
        [
            "EHLO localhost",
            AUTH_ME,
            "MAIL FROM:<me@x.com>",
            "RCPT TO:<a@x.com>",
            "RCPT TO:<b@x.com>",
            "RCPT TO:<c@x.com>",
            "DATA",
            "QUIT",
        ]
    );
    assert!(!transcript.tls);
    assert!(transcript.quit);
    assert!(transcript.eof);

    let message = delivered(transcript.data);
    assert_eq!(message.headers().get("Subject"), Some("=?UTF-8?B?R3LDvMOfZQ==?="));
    assert_eq!(message.headers().get("From"), Some("Me <me@x.com>"));
    assert_eq!(message.headers().get("To"), Some("a@x.com"));
    assert_eq!(message.headers().get("Cc"), Some("b@x.com"));
    assert_eq!(message.headers().get("Bcc"), Some("c@x.com"));
    assert_eq!(message.body(), "<p>héllo</p>\n.hidden\n".as_bytes());
}

#[tokio::test]
async fn direct_send_without_password_skips_auth() {
    init_tracing();
    let server = Server::start(Behaviour {
        auth: true,
        ..Behaviour::default()
    })
    .await;

    mailsend::send(&server.addr(), "", &Mail::new("me@x.com").to("a@x.com"))
        .await
        .unwrap();

    let transcript = server.finish().await;
    assert!(!transcript.commands.iter().any(|c| c.starts_with("AUTH")));
    assert!(transcript.quit);
}

#[tokio::test]
async fn direct_send_rejects_unverifiable_certificate() {
    init_tracing();
    let server = Server::start(Behaviour {
        starttls: true,
        auth: true,
        ..Behaviour::default()
    })
    .await;

    let err = mailsend::send(&server.addr(), "secret", &mail())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Session {
            stage: Stage::StartTls,
            source: mailsend_smtp::Error::Tls(_),
        }
    ));

    let transcript = server.finish().await;
    assert_eq!(transcript.commands, ["EHLO localhost", "STARTTLS"]);
    assert!(transcript.handshake_failed);
}

#[tokio::test]
async fn skip_verify_send_accepts_self_signed_certificate() {
    init_tracing();
    let server = Server::start(Behaviour {
        starttls: true,
        auth: true,
        ..Behaviour::default()
    })
    .await;

    mailsend::send_skip_cert_verify(&server.addr(), "secret", &mail())
        .await
        .unwrap();

    let transcript = server.finish().await;
    assert!(transcript.tls);
    assert_eq!(
        transcript.commands,
        [
            "EHLO localhost",
            "STARTTLS",
            "EHLO localhost",
            AUTH_ME,
            "MAIL FROM:<me@x.com>",
            "RCPT TO:<a@x.com>",
            "RCPT TO:<b@x.com>",
            "RCPT TO:<c@x.com>",
            "DATA",
            "QUIT",
        ]
    );
    assert_eq!(
        delivered(transcript.data).body(),
        "<p>héllo</p>\n.hidden\n".as_bytes()
    );
}

#[tokio::test]
async fn skip_verify_send_requires_starttls() {
    init_tracing();
    let server = Server::start(Behaviour::default()).await;

    let err = mailsend::send_skip_cert_verify(&server.addr(), "", &mail())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Session {
            stage: Stage::StartTls,
            source: mailsend_smtp::Error::NotSupported(_),
        }
    ));

    let transcript = server.finish().await;
    assert_eq!(transcript.commands, ["EHLO localhost"]);
    assert!(transcript.eof);
}

#[tokio::test]
async fn rejected_recipient_aborts_before_data() {
    init_tracing();
    let server = Server::start(Behaviour {
        starttls: true,
        reject: vec!["b@x.com"],
        ..Behaviour::default()
    })
    .await;

    let err = mailsend::send_skip_cert_verify(&server.addr(), "", &mail())
        .await
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Rcpt));
    assert_eq!(err.reply_code(), Some(550));

    let transcript = server.finish().await;
    assert_eq!(
        transcript.commands.last().map(String::as_str),
        Some("RCPT TO:<b@x.com>")
    );
    assert!(!transcript.commands.iter().any(|c| c == "DATA"));
    assert!(transcript.data.is_none());
    assert!(!transcript.quit);
    assert!(transcript.eof, "connection was not released");
}

#[tokio::test]
async fn mailer_uses_configured_names() {
    init_tracing();
    let server = Server::start(Behaviour {
        auth: true,
        ..Behaviour::default()
    })
    .await;

    let config = Config::builder("127.0.0.1")
        .port(server.port())
        .hello_name("client.test")
        .username("relay")
        .connect_timeout(Duration::from_secs(5))
        .build();
    Mailer::new(config)
        .send("secret", &Mail::new("me@x.com").to("a@x.com"))
        .await
        .unwrap();

    let transcript = server.finish().await;
    assert_eq!(transcript.commands[0], "EHLO client.test");
    assert_eq!(transcript.commands[1], "AUTH PLAIN AHJlbGF5AHNlY3JldA==");
}

#[tokio::test]
async fn preconditions_fail_before_connecting() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let cases = [
        (Mail::new("").to("a@x.com"), "from"),
        (Mail::new("me@x.com"), "to"),
        (Mail::new("me@x.com").to("not-an-address"), "address"),
    ];

    for (mail, expected) in cases {
        for skip_verify in [false, true] {
            let result = if skip_verify {
                mailsend::send_skip_cert_verify(&addr, "secret", &mail).await
            } else {
                mailsend::send(&addr, "secret", &mail).await
            };
            let err = result.unwrap_err();
            assert!(err.is_precondition());
            match expected {
                "from" => assert!(matches!(err, Error::NoFrom)),
                "to" => assert!(matches!(err, Error::NoTo)),
                _ => assert!(matches!(err, Error::Address(_))),
            }
        }
    }

    let err = mailsend::send("localhost", "", &Mail::new("me@x.com").to("a@x.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidAddr { .. }));

    let accepted = tokio::time::timeout(Duration::from_millis(200), listener.accept()).await;
    assert!(accepted.is_err(), "a connection was attempted");
}
