use std::sync::Arc;

use actix::prelude::*;
use inspection::{
    DatasetSummary, DateRange, InspectionService, PredictionResult, RawRecord, SimulationCount,
    Status, TrainingMetrics,
};

/* -------------------------------------------------------------------------- */
/*                               Actix messages                               */
/* -------------------------------------------------------------------------- */

#[derive(Message)]
#[rtype(result = "inspection::Result<TrainingMetrics>")]
pub struct Train {
    pub training_records: Vec<RawRecord>,
    pub testing_records: Vec<RawRecord>,
    pub training_period: DateRange,
    pub testing_period: DateRange,
}

#[derive(Message)]
#[rtype(result = "SimulationCount")]
pub struct CountSimulation {
    pub period: DateRange,
    pub records: Option<Vec<RawRecord>>,
}

#[derive(Message)]
#[rtype(result = "inspection::Result<PredictionResult>")]
pub struct PredictNext {
    pub period: DateRange,
    pub records: Option<Vec<RawRecord>>,
}

#[derive(Message)]
#[rtype(result = "Status")]
pub struct QueryStatus;

#[derive(Message)]
#[rtype(result = "()")]
pub struct Reset;

#[derive(Message)]
#[rtype(result = "DatasetSummary")]
pub struct Summarize(pub Vec<RawRecord>);

/* -------------------------------------------------------------------------- */
/*                              Inspection actor                              */
/* -------------------------------------------------------------------------- */

/// Single owner of the inspection service.
///
/// Runs on a dedicated sync arbiter since training is CPU bound, messages are handled one at a
/// time in arrival order.
pub struct InspectionActor {
    service: Arc<InspectionService>,
}

impl InspectionActor {
    /// Starts the actor on its own thread.
    pub fn start(service: Arc<InspectionService>) -> Addr<Self> {
        SyncArbiter::start(1, move || Self {
            service: Arc::clone(&service),
        })
    }
}

impl Actor for InspectionActor {
    type Context = SyncContext<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        log::debug!("inspection actor started");
    }
}

impl Handler<Train> for InspectionActor {
    type Result = inspection::Result<TrainingMetrics>;

    fn handle(&mut self, msg: Train, _ctx: &mut Self::Context) -> Self::Result {
        self.service.train(
            &msg.training_records,
            &msg.testing_records,
            &msg.training_period,
            &msg.testing_period,
        )
    }
}

impl Handler<CountSimulation> for InspectionActor {
    type Result = MessageResult<CountSimulation>;

    fn handle(&mut self, msg: CountSimulation, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(
            self.service
                .simulation_count(&msg.period, msg.records.as_deref()),
        )
    }
}

impl Handler<PredictNext> for InspectionActor {
    type Result = inspection::Result<PredictionResult>;

    fn handle(&mut self, msg: PredictNext, _ctx: &mut Self::Context) -> Self::Result {
        self.service
            .predict_next(&msg.period, msg.records.as_deref())
    }
}

impl Handler<QueryStatus> for InspectionActor {
    type Result = MessageResult<QueryStatus>;

    fn handle(&mut self, _msg: QueryStatus, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.service.status())
    }
}

impl Handler<Reset> for InspectionActor {
    type Result = ();

    fn handle(&mut self, _msg: Reset, _ctx: &mut Self::Context) {
        self.service.reset();
    }
}

impl Handler<Summarize> for InspectionActor {
    type Result = MessageResult<Summarize>;

    fn handle(&mut self, msg: Summarize, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.service.summarize(&msg.0))
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use inspection::{InspectError, InspectionConfig};
    use serde_json::json;

    use super::*;

    fn actor() -> Addr<InspectionActor> {
        let config = InspectionConfig::default().with_estimators(NonZeroUsize::new(5).unwrap());
        InspectionActor::start(Arc::new(InspectionService::new(config).unwrap()))
    }

    fn records(values: serde_json::Value) -> Vec<RawRecord> {
        serde_json::from_value(values).unwrap()
    }

    #[actix_rt::test]
    async fn actor_trains_and_predicts() {
        let addr = actor();
        let labeled = records(json!([
            { "Temperature": 10, "Response": 1 },
            { "Temperature": 11, "Response": 1 },
            { "Temperature": 40, "Response": 0 },
            { "Temperature": 41, "Response": 0 },
        ]));

        let metrics = addr
            .send(Train {
                training_records: labeled.clone(),
                testing_records: labeled,
                training_period: DateRange::default(),
                testing_period: DateRange::default(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(metrics.confusion_matrix.total(), 4);

        let sim = records(json!([{ "Temperature": 10.5 }]));
        let res = addr
            .send(PredictNext {
                period: DateRange::default(),
                records: Some(sim),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(res.temperature, 10.5);

        let status = addr.send(QueryStatus).await.unwrap();
        assert_eq!(status.snapshot_length, Some(1));
    }

    #[actix_rt::test]
    async fn actor_resets_and_counts() {
        let addr = actor();

        addr.send(Reset).await.unwrap();
        let res = addr
            .send(PredictNext {
                period: DateRange::default(),
                records: None,
            })
            .await
            .unwrap();
        assert!(matches!(res, Err(InspectError::ModelNotTrained)));

        let count = addr
            .send(CountSimulation {
                period: DateRange::default(),
                records: None,
            })
            .await
            .unwrap();
        assert_eq!(count.total_records, 1000);
    }
}
