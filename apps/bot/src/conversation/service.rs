use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::conversation::events::{Callback, InboundEvent};
use crate::conversation::machine::{self, MachineContext};
use crate::conversation::validation::normalize_phone;
use crate::conversation::{messages, Reply};
use crate::errors::BotError;
use crate::models::user::UserId;
#[cfg(test)]
use crate::models::user::UserRecord;
use crate::reference::ReferenceSource;
use crate::store::UserStore;

/// The single writer of the user document.
///
/// Conversation events and payment confirmations both pass through `gate`,
/// so each load → mutate one record → save cycle completes before the next
/// begins and no update is lost between them.
pub struct Conversation {
    store: Arc<dyn UserStore>,
    references: Arc<dyn ReferenceSource>,
    payment_details: String,
    gate: Mutex<()>,
}

impl Conversation {
    pub fn new(
        store: Arc<dyn UserStore>,
        references: Arc<dyn ReferenceSource>,
        payment_details: String,
    ) -> Self {
        Self {
            store,
            references,
            payment_details,
            gate: Mutex::new(()),
        }
    }

    /// Inbound text message.
    pub async fn on_text(&self, user_id: &str, text: &str) -> Result<Reply, BotError> {
        self.handle(user_id, InboundEvent::Text(text.trim().to_string()))
            .await
    }

    /// Inbound button press carrying a raw callback payload.
    ///
    /// Malformed payloads get a fallback reply and never reach the store.
    pub async fn on_button_press(&self, user_id: &str, payload: &str) -> Result<Reply, BotError> {
        match Callback::parse(payload) {
            Ok(callback) => self.handle(user_id, InboundEvent::Button(callback)).await,
            Err(e) => {
                warn!("User {user_id}: {e}");
                Ok(Reply::edit(messages::UNSUPPORTED_BUTTON, None))
            }
        }
    }

    async fn handle(&self, user_id: &str, event: InboundEvent) -> Result<Reply, BotError> {
        let _guard = self.gate.lock().await;

        let store = self.store.clone();
        let references = self.references.clone();
        let payment_details = self.payment_details.clone();
        let user_id = user_id.to_string();
        // File I/O runs off the async executor; the gate stays held until it returns.
        tokio::task::spawn_blocking(move || {
            let ctx = MachineContext {
                references: references.as_ref(),
                payment_details: &payment_details,
            };
            apply_event(store.as_ref(), &ctx, &user_id, &event)
        })
        .await
        .map_err(|e| BotError::StorageUnavailable(format!("event task failed: {e}")))?
    }

    /// Marks every user registered with `phone` as paid.
    ///
    /// Returns the ids of the matched users; an empty list means nobody has
    /// registered that number yet.
    pub async fn confirm_payment(&self, phone: &str) -> Result<Vec<UserId>, BotError> {
        let phone = normalize_phone(phone)?;
        let _guard = self.gate.lock().await;

        let store = self.store.clone();
        tokio::task::spawn_blocking(move || mark_paid(store.as_ref(), &phone))
            .await
            .map_err(|e| BotError::StorageUnavailable(format!("payment task failed: {e}")))?
    }

    /// Current record of `user_id`, if one exists.
    #[cfg(test)]
    pub async fn user(&self, user_id: &str) -> Result<Option<UserRecord>, BotError> {
        let _guard = self.gate.lock().await;
        Ok(self.store.load()?.remove(user_id))
    }
}

/// One load → apply → save cycle for a single user.
fn apply_event(
    store: &dyn UserStore,
    ctx: &MachineContext<'_>,
    user_id: &str,
    event: &InboundEvent,
) -> Result<Reply, BotError> {
    let mut users = store.load()?;
    let created = !users.contains_key(user_id);
    let record = users.entry(user_id.to_string()).or_default();
    if created {
        info!("New user {user_id}");
    }
    let before = record.clone();

    let reply = machine::apply(record, event, ctx);

    if before.stage != record.stage {
        info!("User {user_id}: {} -> {}", before.stage, record.stage);
    }

    if created || *record != before {
        record.updated_at = Some(Utc::now());
        store.save(&users)?;
    } else {
        debug!("User {user_id}: no change to persist");
    }

    Ok(reply)
}

fn mark_paid(store: &dyn UserStore, phone: &str) -> Result<Vec<UserId>, BotError> {
    let mut users = store.load()?;
    let now = Utc::now();
    let mut matched = Vec::new();
    for (user_id, record) in users.iter_mut() {
        if record.phone.as_deref() == Some(phone) {
            if !record.paid {
                record.paid = true;
                record.updated_at = Some(now);
            }
            matched.push(user_id.clone());
        }
    }

    if matched.is_empty() {
        warn!("Payment for {phone} matched no user");
        return Ok(matched);
    }

    store.save(&users)?;
    info!("Payment for {phone} confirmed for users {matched:?}");
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::fixtures::sample_references;
    use crate::models::user::{Stage, UserMap};
    use crate::store::{JsonFileStore, MemoryStore};

    fn conversation(store: Arc<dyn UserStore>) -> Conversation {
        Conversation::new(
            store,
            Arc::new(sample_references()),
            "Kaspi Gold: 8702 *** ****".to_string(),
        )
    }

    /// Store that can be switched into failing mode.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: std::sync::atomic::AtomicBool,
    }

    impl UserStore for FlakyStore {
        fn load(&self) -> Result<UserMap, BotError> {
            self.inner.load()
        }

        fn save(&self, users: &UserMap) -> Result<(), BotError> {
            if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(BotError::StorageUnavailable("disk full".into()));
            }
            self.inner.save(users)
        }
    }

    #[tokio::test]
    async fn test_first_event_creates_record() {
        let store = Arc::new(MemoryStore::default());
        let bot = conversation(store.clone());

        bot.on_text("1", "1234").await.unwrap();

        let record = store.load().unwrap().remove("1").unwrap();
        assert_eq!(record.stage, Stage::Phone);
        assert!(!record.paid);
        assert!(record.phone.is_none());
        assert!(record.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_full_conversation_with_payment_confirmation() {
        let store = Arc::new(MemoryStore::default());
        let bot = conversation(store.clone());

        bot.on_text("42", "/start").await.unwrap();
        bot.on_text("42", "8 (702) 111-22-33").await.unwrap();

        let pending = bot.on_button_press("42", "check_paid").await.unwrap();
        assert_eq!(pending.text, messages::PAYMENT_PENDING);

        let matched = bot.confirm_payment("+8 702 111 22 33").await.unwrap();
        assert_eq!(matched, vec!["42".to_string()]);

        bot.on_button_press("42", "check_paid").await.unwrap();
        bot.on_button_press("42", "grade|11").await.unwrap();
        bot.on_button_press("42", "rate|Math|5").await.unwrap();
        bot.on_button_press("42", "rate|Physics|4").await.unwrap();
        let result = bot.on_button_press("42", "rate|Art|1").await.unwrap();

        assert!(result.text.contains("1. CareerX\n2. CareerY"));
        let record = bot.user("42").await.unwrap().unwrap();
        assert_eq!(record.stage, Stage::Finished);
        assert!(record.paid);
        assert_eq!(record.ratings.len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_payload_leaves_store_untouched() {
        let store = Arc::new(MemoryStore::default());
        let bot = conversation(store.clone());
        bot.on_text("1", "87021112233").await.unwrap();
        let before = store.load().unwrap();

        let reply = bot.on_button_press("2", "rate|Math").await.unwrap();

        assert_eq!(reply.text, messages::UNSUPPORTED_BUTTON);
        assert_eq!(store.load().unwrap(), before);
    }

    #[tokio::test]
    async fn test_one_users_input_does_not_touch_another() {
        let store = Arc::new(MemoryStore::default());
        let bot = conversation(store.clone());
        bot.on_text("alice", "87021112233").await.unwrap();
        let alice = store.load().unwrap()["alice"].clone();

        bot.on_text("bob", "12").await.unwrap();
        bot.on_button_press("bob", "grade|9").await.unwrap();
        bot.on_text("bob", "/start").await.unwrap();

        assert_eq!(store.load().unwrap()["alice"], alice);
    }

    #[tokio::test]
    async fn test_unchanged_record_is_not_rewritten() {
        let store = Arc::new(MemoryStore::default());
        let bot = conversation(store.clone());
        bot.on_text("1", "87021112233").await.unwrap();
        let before = store.load().unwrap();

        bot.on_button_press("1", "check_paid").await.unwrap();

        assert_eq!(store.load().unwrap(), before);
    }

    #[tokio::test]
    async fn test_storage_failure_aborts_event() {
        let store = Arc::new(FlakyStore::default());
        let bot = conversation(store.clone());
        bot.on_text("1", "/start").await.unwrap();

        store
            .failing
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let err = bot.on_text("1", "87021112233").await.unwrap_err();

        assert!(matches!(err, BotError::StorageUnavailable(_)));
        assert_eq!(store.load().unwrap()["1"].stage, Stage::Phone);
    }

    #[tokio::test]
    async fn test_confirm_payment_rejects_short_phone() {
        let bot = conversation(Arc::new(MemoryStore::default()));
        let err = bot.confirm_payment("123").await.unwrap_err();
        assert!(matches!(err, BotError::ValidationFailure(_)));
    }

    #[tokio::test]
    async fn test_confirm_payment_without_match_returns_empty() {
        let bot = conversation(Arc::new(MemoryStore::default()));
        bot.on_text("1", "87021112233").await.unwrap();

        let matched = bot.confirm_payment("87770000000").await.unwrap();

        assert!(matched.is_empty());
        assert!(!bot.user("1").await.unwrap().unwrap().paid);
    }

    /// Store that pauses between reading and writing, so unserialized
    /// load → save cycles would overwrite each other.
    #[derive(Default)]
    struct SlowStore {
        inner: MemoryStore,
    }

    impl UserStore for SlowStore {
        fn load(&self) -> Result<UserMap, BotError> {
            let users = self.inner.load()?;
            std::thread::sleep(std::time::Duration::from_millis(5));
            Ok(users)
        }

        fn save(&self, users: &UserMap) -> Result<(), BotError> {
            std::thread::sleep(std::time::Duration::from_millis(2));
            self.inner.save(users)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_events_and_payments_are_not_lost() {
        let store = Arc::new(SlowStore::default());
        let bot = Arc::new(conversation(store.clone()));

        for i in 0..8 {
            bot.on_text(&format!("u{i}"), &format!("8702000000{i}"))
                .await
                .unwrap();
        }

        let mut tasks = Vec::new();
        for i in 0..8 {
            let payer = bot.clone();
            tasks.push(tokio::spawn(async move {
                payer.confirm_payment(&format!("8702000000{i}")).await
            }));
            // Every chatter event changes a record and is saved.
            let chatter = bot.clone();
            tasks.push(tokio::spawn(async move {
                let user = format!("u{}", (i + 1) % 8);
                for round in 0..3 {
                    let text = if round % 2 == 0 {
                        "/start".to_string()
                    } else {
                        format!("8702000000{}", (i + 1) % 8)
                    };
                    chatter.on_text(&user, &text).await?;
                }
                Ok::<Vec<UserId>, BotError>(Vec::new())
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let users = store.load().unwrap();
        assert_eq!(users.len(), 8);
        for (id, user) in &users {
            assert!(user.paid, "payment for {id} was lost");
        }
    }

    #[tokio::test]
    async fn test_file_store_backs_the_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn UserStore> = Arc::new(JsonFileStore::new(dir.path().join("db.json")));
        let bot = conversation(store.clone());

        bot.on_text("7", "87021112233").await.unwrap();
        bot.confirm_payment("87021112233").await.unwrap();

        let record = store.load().unwrap().remove("7").unwrap();
        assert_eq!(record.stage, Stage::AfterPhone);
        assert!(record.paid);
    }
}
