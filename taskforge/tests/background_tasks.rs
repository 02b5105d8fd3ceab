mod common;

use chrono::{Duration, Utc};
use common::{extract_code, setup_with_config, wait_for_mail};
use taskforge::{CodePurpose, NewRegistration, NewTodo, TaskforgeConfig};
use taskforge_core::code::NewVerificationCode;
use taskforge_core::repositories::{CodeRepository, CodeRepositoryProvider, TodoRepositoryProvider, TodoRepository};

fn fast_config() -> TaskforgeConfig {
    let mut config = TaskforgeConfig::new(b"integration_test_secret_key".to_vec());
    config.app.cleanup_interval = std::time::Duration::from_millis(50);
    config.app.reminder_interval = std::time::Duration::from_millis(50);
    config
}

#[tokio::test]
async fn background_tasks_clean_codes_and_send_reminders() {
    let harness = setup_with_config(fast_config()).await;

    // An activated user who owns an item due inside the reminder window
    harness
        .taskforge
        .register(NewRegistration {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "Secret1!pass".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
        })
        .await
        .unwrap();
    wait_for_mail(&harness.mailer, 1).await;
    let code = extract_code(&harness.mailer.sent.lock().unwrap()[0].body);
    assert!(
        harness
            .taskforge
            .verify_email("alice@x.com", &code)
            .await
            .unwrap()
    );

    harness
        .repositories
        .todos()
        .insert(
            NewTodo::new("alice".to_string(), "Submit report".to_string())
                .with_due_date(Utc::now() + Duration::hours(24) + Duration::minutes(1)),
        )
        .await
        .unwrap();

    // An expired code for the cleanup task to collect
    harness
        .repositories
        .codes()
        .insert(NewVerificationCode::new(
            "alice@x.com".to_string(),
            "111111".to_string(),
            CodePurpose::EmailVerification,
            Utc::now() - Duration::minutes(10),
        ))
        .await
        .unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let handles = harness.taskforge.start_background_tasks(shutdown_rx);
    assert_eq!(handles.len(), 2);

    // Wait for a reminder to land
    for _ in 0..200 {
        let found = harness
            .mailer
            .sent
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.subject == "Todo Reminder - Submit report");
        if found {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    {
        let sent = harness.mailer.sent.lock().unwrap();
        let reminder = sent
            .iter()
            .find(|m| m.subject == "Todo Reminder - Submit report")
            .expect("reminder was not sent");
        assert_eq!(reminder.to, "alice@x.com");
        assert!(reminder.body.contains("Submit report"));
    }

    // Let the cleanup loop tick at least once more, then confirm it already
    // removed the expired code: deleting again finds nothing
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let remaining = harness
        .repositories
        .codes()
        .delete_expired_before(Utc::now())
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    shutdown_tx.send(true).unwrap();
    for handle in handles {
        handle.await.unwrap();
    }
}
