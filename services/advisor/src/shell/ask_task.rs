//! services/advisor/src/shell/ask_task.rs
//!
//! This module contains the asynchronous "worker" responsible for handling a
//! single question-and-answer exchange with the advisory backend.

use crate::shell::state::AppState;
use futures::StreamExt;
use pet_advisor_core::{
    domain::{AskRequest, PetProfile},
    events::{EventStreamDecoder, Record, StreamEvent},
    exchange::{Exchange, Flow},
    ports::{AdvisoryService, PortResult},
    registry::match_pet,
    transcript::Transcript,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Streams the answer to an exchange the shell already opened on the session
/// transcript held by `app_state`.
pub async fn ask_process(app_state: Arc<AppState>, exchange: Exchange, question: String) {
    let pets = app_state.registry.lock().await.list().to_vec();
    answer(
        app_state.advisor.as_ref(),
        exchange,
        &question,
        &app_state.transcript,
        &pets,
    )
    .await;
}

/// Runs one exchange against `transcript`.
///
/// Appends the user's question and an assistant placeholder, streams the answer
/// into the placeholder, and always leaves it holding readable text. Does nothing
/// when the trimmed question is empty or the transcript already has an exchange in
/// flight.
pub async fn submit(
    advisor: &dyn AdvisoryService,
    question: &str,
    transcript: &Mutex<Transcript>,
    pets: &[PetProfile],
) {
    let exchange = {
        let mut transcript = transcript.lock().await;
        match Exchange::begin(&mut transcript, question) {
            Some(exchange) => exchange,
            None => {
                info!("Ignoring question: blank, or an answer is still streaming.");
                return;
            }
        }
    };
    answer(advisor, exchange, question, transcript, pets).await;
}

/// Streams the answer to `question` into the placeholder of `exchange` and closes
/// the exchange.
pub async fn answer(
    advisor: &dyn AdvisoryService,
    mut exchange: Exchange,
    question: &str,
    transcript: &Mutex<Transcript>,
    pets: &[PetProfile],
) {
    let question = question.trim();
    let start_time = Instant::now();
    info!("Ask process started.");

    let pet = match_pet(question, pets);
    if let Some(pet) = pet {
        info!(pet = %pet.name, "Question mentions a pet, attaching its profile.");
    }
    let request = AskRequest::new(question, pet);

    let outcome = stream_answer(advisor, &request, &mut exchange, transcript, start_time).await;

    let mut transcript = transcript.lock().await;
    match outcome {
        Ok(()) => exchange.finish(&mut transcript),
        Err(e) => {
            error!("Failed to get an answer from the advisory backend: {}", e);
            exchange.fail(&mut transcript);
        }
    }

    info!("⏱️ Total ask process took: {:?}", start_time.elapsed());
}

/// Reads the answer stream and applies its events until a terminal event or the
/// end of the stream. Errors are transport failures.
async fn stream_answer(
    advisor: &dyn AdvisoryService,
    request: &AskRequest,
    exchange: &mut Exchange,
    transcript: &Mutex<Transcript>,
    start_time: Instant,
) -> PortResult<()> {
    let mut body = advisor.ask(request).await?;
    let mut decoder = EventStreamDecoder::new();
    let mut first_event: Option<Duration> = None;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for payload in decoder.feed(&chunk) {
            let record = match Record::parse(&payload) {
                Ok(record) => record,
                Err(e) => {
                    warn!(payload = %payload, "Failed to parse stream record: {}", e);
                    continue;
                }
            };

            if first_event.is_none() && record.signals_activity {
                let elapsed = start_time.elapsed();
                first_event = Some(elapsed);
                info!("⚡ Time to first event: {:?}", elapsed);
            }

            let Some(event) = record.event else {
                continue;
            };
            if let StreamEvent::Error(message) = &event {
                warn!("Advisory backend reported an error: {}", message);
            }

            let flow = {
                let mut transcript = transcript.lock().await;
                exchange.apply(event, &mut transcript)
            };
            if flow == Flow::Finished {
                return Ok(());
            }
        }
    }

    decoder.finish();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use pet_advisor_core::{
        domain::{Role, Species},
        ports::{ByteStream, PortError},
        transcript::{NO_ANSWER_APOLOGY, UNAVAILABLE_APOLOGY},
    };
    use std::sync::Mutex as StdMutex;
    use tokio::sync::oneshot;

    enum Step {
        Chunk(Vec<u8>),
        Fail,
    }

    /// Replays a fixed answer body, optionally holding it back until released.
    struct ScriptedAdvisor {
        status: Option<u16>,
        steps: StdMutex<Vec<Step>>,
        gate: StdMutex<Option<oneshot::Receiver<()>>>,
        requests: StdMutex<Vec<AskRequest>>,
    }

    impl ScriptedAdvisor {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                status: None,
                steps: StdMutex::new(steps),
                gate: StdMutex::new(None),
                requests: StdMutex::new(Vec::new()),
            }
        }

        fn body(text: &str) -> Self {
            Self::new(vec![Step::Chunk(text.as_bytes().to_vec())])
        }

        fn failing_with(status: u16) -> Self {
            Self {
                status: Some(status),
                ..Self::new(Vec::new())
            }
        }

        fn gated(mut self) -> (Self, oneshot::Sender<()>) {
            let (tx, rx) = oneshot::channel();
            self.gate = StdMutex::new(Some(rx));
            (self, tx)
        }

        fn last_request(&self) -> AskRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl AdvisoryService for ScriptedAdvisor {
        async fn ask(&self, request: &AskRequest) -> PortResult<ByteStream> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(status) = self.status {
                return Err(PortError::Status(status));
            }
            let steps = std::mem::take(&mut *self.steps.lock().unwrap());
            let items = steps.into_iter().map(|step| match step {
                Step::Chunk(bytes) => Ok(Bytes::from(bytes)),
                Step::Fail => Err(PortError::Transport("connection reset".into())),
            });
            let body = futures::stream::iter(items);
            match self.gate.lock().unwrap().take() {
                Some(gate) => {
                    let hold = futures::stream::once(async move {
                        let _ = gate.await;
                    })
                    .filter_map(|_| async { None::<PortResult<Bytes>> });
                    Ok(Box::pin(hold.chain(body)))
                }
                None => Ok(Box::pin(body)),
            }
        }
    }

    fn pets() -> Vec<PetProfile> {
        vec![
            PetProfile::new("旺财", Species::Dog, "金毛").with_allergies(["牛肉", "小麦"]),
            PetProfile::new("咪咪", Species::Cat, "英短"),
        ]
    }

    async fn answer_for(advisor: &ScriptedAdvisor) -> (String, Transcript) {
        let transcript = Mutex::new(Transcript::new());
        submit(advisor, "葡萄能吃吗", &transcript, &pets()).await;
        let transcript = transcript.into_inner();
        let content = transcript.last().unwrap().content().to_string();
        (content, transcript)
    }

    #[tokio::test]
    async fn deltas_then_done() {
        let advisor = ScriptedAdvisor::body(
            "data: {\"content\":\"A\"}\n\ndata: {\"content\":\"B\"}\n\ndata: {\"done\":true}\n\n",
        );
        let (content, transcript) = answer_for(&advisor).await;
        assert_eq!(content, "AB");
        assert!(!transcript.is_in_flight());
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0].role(), Role::User);
        assert_eq!(transcript.messages()[1].role(), Role::Assistant);
    }

    #[tokio::test]
    async fn formatted_answer_wins() {
        let advisor = ScriptedAdvisor::body(
            "data: {\"status\":\"thinking\"}\n\ndata: {\"formatted\":\"Full answer.\"}\n\ndata: {\"done\":true}\n\n",
        );
        let (content, _) = answer_for(&advisor).await;
        assert_eq!(content, "Full answer.");
    }

    #[tokio::test]
    async fn upstream_error_is_apologised_for() {
        let advisor = ScriptedAdvisor::body("data: {\"error\":\"rate limited\"}\n\n");
        let (content, transcript) = answer_for(&advisor).await;
        assert_eq!(content, "抱歉，rate limited");
        assert!(!transcript.is_in_flight());
    }

    #[tokio::test]
    async fn bad_status_is_a_transport_failure() {
        let advisor = ScriptedAdvisor::failing_with(503);
        let (content, transcript) = answer_for(&advisor).await;
        assert_eq!(content, UNAVAILABLE_APOLOGY);
        assert!(!transcript.is_in_flight());
    }

    #[tokio::test]
    async fn broken_stream_replaces_partial_answer() {
        let advisor = ScriptedAdvisor::new(vec![
            Step::Chunk(b"data: {\"content\":\"half\"}\n\n".to_vec()),
            Step::Fail,
        ]);
        let (content, _) = answer_for(&advisor).await;
        assert_eq!(content, UNAVAILABLE_APOLOGY);
    }

    #[tokio::test]
    async fn empty_stream_gets_fallback() {
        let advisor = ScriptedAdvisor::new(Vec::new());
        let (content, transcript) = answer_for(&advisor).await;
        assert_eq!(content, NO_ANSWER_APOLOGY);
        assert!(!transcript.is_in_flight());
    }

    #[tokio::test]
    async fn stream_end_without_done_keeps_content() {
        let advisor = ScriptedAdvisor::body("data: {\"content\":\"partial\"}\n\ndata: {\"content\":\" tail\"}");
        let (content, transcript) = answer_for(&advisor).await;
        assert_eq!(content, "partial");
        assert!(!transcript.is_in_flight());
    }

    #[tokio::test]
    async fn malformed_records_are_skipped() {
        let advisor = ScriptedAdvisor::body(
            "data: {\"content\":\"A\"\n\ndata: {\"content\":\"B\"}\n\ndata: {\"done\":true}\n\n",
        );
        let (content, _) = answer_for(&advisor).await;
        assert_eq!(content, "B");
    }

    #[tokio::test]
    async fn mentioned_pet_is_attached() {
        let advisor = ScriptedAdvisor::body("data: {\"done\":true}\n\n");
        let transcript = Mutex::new(Transcript::new());

        submit(&advisor, "旺财可以吃葡萄吗", &transcript, &pets()).await;
        let pet = advisor.last_request().pet.unwrap();
        assert_eq!(pet.name, "旺财");
        assert_eq!(pet.allergies, vec!["牛肉", "小麦"]);

        submit(&advisor, "狗狗可以吃西瓜吗？", &transcript, &pets()).await;
        assert!(advisor.last_request().pet.is_none());
    }

    #[tokio::test]
    async fn blank_question_does_nothing() {
        let advisor = ScriptedAdvisor::body("data: {\"done\":true}\n\n");
        let transcript = Mutex::new(Transcript::new());
        submit(&advisor, "   ", &transcript, &[]).await;
        assert!(transcript.lock().await.is_empty());
        assert!(advisor.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_ignored() {
        let (advisor, release) = ScriptedAdvisor::body(
            "data: {\"content\":\"first\"}\n\ndata: {\"done\":true}\n\n",
        )
        .gated();
        let advisor = Arc::new(advisor);
        let transcript = Arc::new(Mutex::new(Transcript::new()));

        let first = {
            let advisor = advisor.clone();
            let transcript = transcript.clone();
            tokio::spawn(async move {
                submit(advisor.as_ref(), "first", &transcript, &[]).await;
            })
        };

        // Wait until the first exchange has started.
        while !transcript.lock().await.is_in_flight() {
            tokio::task::yield_now().await;
        }
        submit(advisor.as_ref(), "second", &transcript, &[]).await;
        assert_eq!(transcript.lock().await.len(), 2);

        release.send(()).unwrap();
        first.await.unwrap();

        let transcript = transcript.lock().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.last().unwrap().content(), "first");
        assert!(!transcript.is_in_flight());
    }

    #[tokio::test]
    async fn chunking_never_changes_the_answer() {
        let body = "data: {\"status\":\"thinking\"}\n\ndata: {\"content\":\"葡萄对狗狗\"}\n\n\
                    data: {\"content\":\"有毒🍇\"}\n\ndata: {\"done\":true}\n\n";
        let bytes = body.as_bytes();

        for chunk_size in 1..=bytes.len() {
            let steps = bytes
                .chunks(chunk_size)
                .map(|c| Step::Chunk(c.to_vec()))
                .collect();
            let (content, _) = answer_for(&ScriptedAdvisor::new(steps)).await;
            assert_eq!(content, "葡萄对狗狗有毒🍇", "chunk size {chunk_size}");
        }
    }
}
