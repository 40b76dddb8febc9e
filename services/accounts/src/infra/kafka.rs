use std::sync::Arc;
use std::time::Duration;

use kafka::consumer::{Consumer, FetchOffset, GroupOffsetStorage};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::consumer::{ConfirmationConsumer, ConfirmationTopic, Outcome};
use crate::domain::repository::TransactionCoordinator;

const POLL_BACKOFF: Duration = Duration::from_secs(1);

/// Run one blocking broker consumer for `topic` on the blocking pool.
///
/// Offsets are marked after each message reaches a terminal outcome and
/// committed to the group after each polled batch.
pub fn spawn_confirmation_worker<C>(
    brokers: Vec<String>,
    group: String,
    topic: ConfirmationTopic,
    consumer: Arc<ConfirmationConsumer<C>>,
) -> JoinHandle<()>
where
    C: TransactionCoordinator + 'static,
{
    let runtime = Handle::current();
    tokio::task::spawn_blocking(move || run(brokers, group, topic, consumer, runtime))
}

fn run<C: TransactionCoordinator>(
    brokers: Vec<String>,
    group: String,
    topic: ConfirmationTopic,
    consumer: Arc<ConfirmationConsumer<C>>,
    runtime: Handle,
) {
    let mut broker = match Consumer::from_hosts(brokers)
        .with_topic(topic.name().to_owned())
        .with_group(group)
        .with_fallback_offset(FetchOffset::Earliest)
        .with_offset_storage(Some(GroupOffsetStorage::Kafka))
        .create()
    {
        Ok(broker) => broker,
        Err(e) => {
            error!(topic = topic.name(), error = %e, "failed to create kafka consumer");
            return;
        }
    };
    info!(topic = topic.name(), "confirmation consumer started");

    loop {
        let sets = match broker.poll() {
            Ok(sets) => sets,
            Err(e) => {
                warn!(topic = topic.name(), error = %e, "kafka poll failed");
                std::thread::sleep(POLL_BACKOFF);
                continue;
            }
        };

        for set in sets.iter() {
            for message in set.messages() {
                let outcome = runtime.block_on(consumer.process(topic, message.value));
                match outcome {
                    Outcome::Applied { changed } => debug!(
                        topic = topic.name(),
                        partition = set.partition(),
                        offset = message.offset,
                        changed,
                        "confirmation applied"
                    ),
                    Outcome::Failed(cause) => error!(
                        topic = topic.name(),
                        partition = set.partition(),
                        offset = message.offset,
                        error = %cause,
                        "confirmation failed"
                    ),
                }
                if let Err(e) = broker.consume_message(set.topic(), set.partition(), message.offset)
                {
                    warn!(topic = topic.name(), error = %e, "failed to mark offset consumed");
                }
            }
        }

        if let Err(e) = broker.commit_consumed() {
            warn!(topic = topic.name(), error = %e, "failed to commit offsets");
        }
    }
}
