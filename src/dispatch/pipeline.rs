//! Pre-handler pipeline.
//!
//! Every stage runs, in registration order, for every parsed request,
//! including requests that end up unmatched. Stages cannot stop dispatch;
//! a stage that wants to reject a request writes its own reply to the sink
//! and routing still proceeds afterwards.

use std::fmt;
use std::sync::Arc;

use crate::handler::{PreHandler, ResponseSink};
use crate::protocol::Request;

#[derive(Default, Clone)]
pub struct Pipeline {
    stages: Vec<Arc<dyn PreHandler>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append<P: PreHandler>(&mut self, stage: P) {
        self.stages.push(Arc::new(stage));
    }

    pub fn run_all(&self, sink: &ResponseSink, request: &mut Request) {
        for stage in &self.stages {
            stage.call(sink, request);
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::MessageId;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[test]
    fn stages_run_in_order_and_share_headers() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();

        let o = order.clone();
        pipeline.append(move |_: &ResponseSink, req: &mut Request| {
            o.lock().unwrap().push("first");
            req.headers_mut().insert("user".into(), "ada".into());
        });
        let o = order.clone();
        pipeline.append(move |_: &ResponseSink, req: &mut Request| {
            o.lock().unwrap().push("second");
            let user = req.header("user").unwrap_or_default().to_uppercase();
            req.headers_mut().insert("user".into(), user);
        });

        let (tx, _rx) = mpsc::unbounded_channel();
        let sink = ResponseSink::new(MessageId::new(1), tx);
        let mut req = Request::parse(b"/x\n\n").unwrap();
        pipeline.run_all(&sink, &mut req);

        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(req.header("user"), Some("ADA"));
    }
}
