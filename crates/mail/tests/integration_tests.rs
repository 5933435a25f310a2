//! Integration tests for the mail crate
//!
//! These tests drive the complete flow from fetching through mutation and
//! thread reconstruction against an in-memory account.

use chrono::{Duration, Utc};
use gmail_imap::imap::Request;
use gmail_imap::{
    Ack, Flag, InMemoryTransport, MailError, MailboxNames, Message, Session, Status, StoredMessage,
    ThreadId, Uid, UidCommand,
};

const SENT: &str = "[Gmail]/Sent Mail";
const TRASH: &str = "[Gmail]/Trash";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn simple(subject: &str, date: &str) -> Vec<u8> {
    format!(
        "From: a@example.com\r\nTo: b@example.com\r\nSubject: {}\r\nDate: {}\r\n\r\nHello\r\n",
        subject, date
    )
    .into_bytes()
}

/// Helper to create an account with a two-message thread
fn account() -> InMemoryTransport {
    let mut transport = InMemoryTransport::new();
    transport.insert(
        "INBOX",
        Uid(7),
        StoredMessage::new("4242", "1", &simple("Re: lunch", "Fri, 8 Mar 2024 12:30:00 +0000"))
            .with_labels(["\\Inbox", "Friends"]),
    );
    transport.insert(
        SENT,
        Uid(2),
        StoredMessage::new("4242", "2", &simple("lunch", "Thu, 7 Mar 2024 18:00:00 +0000"))
            .with_flags([Flag::Seen]),
    );
    transport.add_mailbox("[Gmail]/All Mail");
    transport.add_mailbox(TRASH);
    transport
}

fn session() -> Session<InMemoryTransport> {
    init_logging();
    Session::new(account(), MailboxNames::default())
}

#[test]
fn test_fetch_populates_message() {
    let mut session = session();
    let mut message = Message::new("INBOX", Uid(7));

    let tree = message.fetch(&mut session, true, false).unwrap();
    assert!(tree.is_some());
    assert_eq!(message.subject.as_deref(), Some("Re: lunch"));
    assert_eq!(message.thread_id, Some(ThreadId::new("4242")));
    assert_eq!(message.labels, vec!["\\Inbox".to_string(), "Friends".to_string()]);
    assert!(message.raw.is_some());
    assert!(message.body.as_deref().unwrap().starts_with("Hello"));
}

#[test]
fn test_fetch_skips_round_trip_once_fetched() {
    let mut session = session();
    let mut message = Message::new("INBOX", Uid(7));
    message.fetch(&mut session, false, false).unwrap();
    message.fetch(&mut session, false, false).unwrap();
    assert_eq!(session.transport().uid_commands().len(), 1);

    message.fetch(&mut session, false, true).unwrap();
    assert_eq!(session.transport().uid_commands().len(), 2);
}

#[test]
fn test_fetch_light_has_no_body() {
    let mut session = session();
    let mut message = Message::new(SENT, Uid(2));
    message.fetch_light(&mut session, false).unwrap();

    assert!(message.is_read());
    assert_eq!(message.thread_id, Some(ThreadId::new("4242")));
    assert!(message.body.is_none());
    assert!(!message.is_fetched());

    let commands = session.transport().uid_commands();
    assert_eq!(
        commands[0].to_string(),
        "UID FETCH 2 (FLAGS X-GM-THRID X-GM-MSGID X-GM-LABELS)"
    );
}

#[test]
fn test_fetch_of_missing_uid_reports_missing_response() {
    let mut session = session();
    let mut message = Message::new("INBOX", Uid(404));

    let err = message.fetch(&mut session, false, false).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MailError>(),
        Some(MailError::MissingResponse { .. })
    ));
}

#[test]
fn test_rejected_fetch_is_an_error() {
    let mut session = session();
    session.transport().reject("INBOX", "FETCH");
    let mut message = Message::new("INBOX", Uid(7));

    let err = message.fetch(&mut session, false, false).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MailError>(),
        Some(MailError::CommandRejected { status: Status::No, .. })
    ));
}

#[test]
fn test_star_then_unstar() {
    let mut session = session();
    let mut message = Message::new("INBOX", Uid(7));

    assert_eq!(message.star(&mut session).unwrap(), Ack::Confirmed);
    assert!(message.is_starred());
    assert_eq!(message.unstar(&mut session).unwrap(), Ack::Confirmed);
    assert!(!message.flags.contains(&Flag::Flagged));

    let commands: Vec<String> = session
        .transport()
        .uid_commands()
        .into_iter()
        .map(UidCommand::to_string)
        .collect();
    assert_eq!(
        commands,
        vec!["UID STORE 7 +FLAGS \\Flagged", "UID STORE 7 -FLAGS \\Flagged"]
    );
    assert!(session.transport().message("INBOX", Uid(7)).unwrap().flags.is_empty());
}

#[test]
fn test_delete_in_trash_does_not_move() {
    let mut session = session();
    session
        .transport()
        .insert(TRASH, Uid(1), StoredMessage::new("1", "9", &simple("x", "y")));
    let mut message = Message::new(TRASH, Uid(1));

    message.delete(&mut session).unwrap();
    assert!(message.is_deleted());
    let copies = session
        .transport()
        .uid_commands()
        .into_iter()
        .filter(|c| matches!(c, UidCommand::Copy { .. }))
        .count();
    assert_eq!(copies, 0);
}

#[test]
fn test_delete_picks_account_trash_name() {
    init_logging();
    let mut transport = InMemoryTransport::new();
    transport.insert("INBOX", Uid(3), StoredMessage::new("1", "9", &simple("x", "y")));
    transport.add_mailbox("[Gmail]/Bin");
    let mut session = Session::new(transport, MailboxNames::default());
    let mut message = Message::new("INBOX", Uid(3));

    assert!(message.delete(&mut session).unwrap().is_confirmed());
    assert_eq!(session.transport().uids("[Gmail]/Bin"), vec![Uid(1)]);
}

#[test]
fn test_archive_copies_to_all_mail() {
    let mut session = session();
    let mut message = Message::new("INBOX", Uid(7));

    assert!(message.archive(&mut session).unwrap().is_confirmed());
    assert_eq!(session.transport().uids("[Gmail]/All Mail").len(), 1);
    assert_eq!(session.transport().uids(TRASH).len(), 1);
    assert!(message.is_deleted());
}

#[test]
fn test_fetch_thread_sorted_by_sent_at() {
    let mut session = session();
    let mut message = Message::new("INBOX", Uid(7));

    let thread = message.fetch_thread(&mut session).unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0].mailbox, SENT);
    assert_eq!(thread[0].subject.as_deref(), Some("lunch"));
    assert_eq!(thread[1].mailbox, "INBOX");
    assert!(thread[0].sent_at < thread[1].sent_at);
    assert_eq!(session.current_mailbox(), Some("INBOX"));
}

#[test]
fn test_fetch_thread_reverse_insertion_order() {
    init_logging();
    let mut transport = InMemoryTransport::new();
    // The newer message gets the lower UID
    transport.insert(
        "INBOX",
        Uid(1),
        StoredMessage::new("5", "1", &simple("newest", "Sun, 10 Mar 2024 10:00:00 +0000")),
    );
    transport.insert(
        "INBOX",
        Uid(2),
        StoredMessage::new("5", "2", &simple("middle", "Sat, 9 Mar 2024 10:00:00 +0000")),
    );
    transport.insert(
        SENT,
        Uid(1),
        StoredMessage::new("5", "3", &simple("oldest", "Fri, 8 Mar 2024 10:00:00 +0000")),
    );
    let mut session = Session::new(transport, MailboxNames::default());
    let mut message = Message::new("INBOX", Uid(1));

    let thread = message.fetch_thread(&mut session).unwrap();
    let subjects: Vec<_> = thread.iter().map(|m| m.subject.clone().unwrap()).collect();
    assert_eq!(subjects, vec!["oldest", "middle", "newest"]);
}

#[test]
fn test_fetch_thread_failed_search_yields_empty_half() {
    let mut session = session();
    session.transport().reject("INBOX", "SEARCH");
    let mut message = Message::new("INBOX", Uid(7));

    let thread = message.fetch_thread(&mut session).unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].mailbox, SENT);

    let searches: Vec<&Request> = session
        .transport()
        .requests()
        .iter()
        .filter(|r| matches!(r, Request::Uid { command: UidCommand::Search { .. }, .. }))
        .collect();
    assert_eq!(searches.len(), 2);
}

#[test]
fn test_multipart_body_and_attachment() {
    init_logging();
    let raw = b"From: a@example.com\r\n\
Subject: notes\r\n\
Date: Fri, 8 Mar 2024 12:30:00 +0000\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\
\r\n\
--XYZ\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
U2VlIGF0dGFjaGVk\r\n\
--XYZ\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Content-Disposition: attachment; filename=\"notes.txt\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
bm90ZSBjb250ZW50\r\n\
--XYZ--\r\n";

    let mut transport = InMemoryTransport::new();
    transport.insert("INBOX", Uid(1), StoredMessage::new("1", "1", raw));
    let mut session = Session::new(transport, MailboxNames::default());
    let mut message = Message::new("INBOX", Uid(1));
    message.fetch(&mut session, false, false).unwrap();

    assert!(message.body.is_some());
    assert_eq!(message.attachments.len(), 1);
    let attachment = &message.attachments[0];
    assert_eq!(attachment.name, "notes.txt");
    assert_eq!(attachment.payload.as_deref(), Some(&b"note content"[..]));
    assert_eq!(attachment.size, Some(0));
}

#[test]
fn test_bad_date_uses_current_time() {
    init_logging();
    let mut transport = InMemoryTransport::new();
    transport.insert("INBOX", Uid(1), StoredMessage::new("1", "1", &simple("x", "not a date")));
    let mut session = Session::new(transport, MailboxNames::default());
    let mut message = Message::new("INBOX", Uid(1));

    message.fetch(&mut session, false, false).unwrap();
    let sent_at = message.sent_at.unwrap();
    assert!(Utc::now() - sent_at < Duration::minutes(1));
}

#[test]
fn test_labels_parse_quotes_and_escapes() {
    let mut message = Message::new("INBOX", Uid(1));
    message.parse_fetch_header("1 (X-GM-LABELS (\"a\" \"b\\ c\") UID 1)");
    assert_eq!(message.labels, vec!["a".to_string(), "b c".to_string()]);
    assert_eq!(message.thread_id, None);
}

#[test]
fn test_attachment_save() {
    init_logging();
    let raw = b"Subject: file\r\n\
Content-Type: multipart/mixed; boundary=\"B\"\r\n\
\r\n\
--B\r\n\
Content-Type: application/octet-stream; name=\"data.bin\"\r\n\
Content-Disposition: attachment\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
AAECAw==\r\n\
--B--\r\n";

    let mut message = Message::new("INBOX", Uid(1));
    message.parse_fetch_body(raw);
    assert_eq!(message.attachments.len(), 1);

    let dir = tempfile::tempdir().unwrap();
    let path = message.attachments[0].save(Some(dir.path())).unwrap();
    assert_eq!(path, dir.path().join("data.bin"));
    assert_eq!(std::fs::read(path).unwrap(), vec![0u8, 1, 2, 3]);
}
