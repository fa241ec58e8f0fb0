//! Mock adapter tests.

use courier::providers::MockMailer;
use courier::{deliver_with, Attachment, Email, MailError, Mailer};

#[tokio::test]
async fn deliver_returns_synthetic_id() {
    let mailer = MockMailer::new();

    let email = Email::new()
        .from("tony.stark@example.com")
        .to("steve.rogers@example.com")
        .subject("Hello, Avengers!")
        .text_body("Hello!");

    let result = mailer.deliver(&email).await.unwrap();
    assert!(!result.message_id.is_empty());
    assert!(result.provider_response.is_none());
}

#[tokio::test]
async fn deliver_with_all_fields() {
    let mailer = MockMailer::new();

    let email = Email::new()
        .from(("T Stark", "tony.stark@example.com"))
        .to("steve.rogers@example.com")
        .to(("Bruce Banner", "bruce.banner@example.com"))
        .cc("natasha.romanoff@example.com")
        .bcc("nick.fury@example.com")
        .reply_to("pepper.potts@example.com")
        .subject("Hello, Avengers!")
        .html_body("<h1>Hello</h1>")
        .text_body("Hello")
        .attachment(Attachment::from_bytes("plan.txt", b"assemble".to_vec()));

    mailer.deliver(&email).await.unwrap();

    let sent = mailer.last_email().unwrap();
    assert_eq!(sent.email.to.len(), 2);
    assert_eq!(sent.email.attachments[0].filename, "plan.txt");
    assert!(mailer.sent_to("nick.fury@example.com"));
}

#[tokio::test]
async fn emails_are_kept_in_send_order() {
    let mailer = MockMailer::new();

    for subject in ["first", "second", "third"] {
        mailer
            .deliver(&Email::new().to("a@example.com").subject(subject))
            .await
            .unwrap();
    }

    let subjects: Vec<_> = mailer
        .emails()
        .into_iter()
        .map(|sent| sent.email.subject)
        .collect();
    assert_eq!(subjects, ["first", "second", "third"]);
}

#[tokio::test]
async fn deliver_with_passes_errors_through() {
    let mailer = MockMailer::new();
    mailer.set_failure("connection refused");

    let email = Email::new().from("a@example.com").to("b@example.com");
    let err = deliver_with(&email, &mailer).await.unwrap_err();

    assert!(matches!(err, MailError::SendError(ref m) if m == "connection refused"));
}
