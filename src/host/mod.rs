mod actor;
pub mod protocol;

pub use actor::InspectionActor;

use actix::Addr;
use anyhow::Result;
use futures::{SinkExt, StreamExt};
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

use protocol::{Request, Response};

/// Longest request line accepted, in bytes.
pub const MAX_LINE_LENGTH: usize = 64 * 1024 * 1024;

/// Serves JSON lines requests from `reader` until it's exhausted, answering on `writer`.
///
/// Malformed lines get a `request` error and don't stop the loop, blank lines are skipped.
///
/// # Arguments
/// * `reader` - Where requests come from.
/// * `writer` - Where responses go, one line per request.
/// * `addr` - The actor owning the inspection service.
///
/// # Returns
/// An io error or a dead actor.
pub async fn serve<R, W>(reader: R, writer: W, addr: Addr<InspectionActor>) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    serve_with_limit(reader, writer, addr, MAX_LINE_LENGTH).await
}

/// Same as `serve`, rejecting request lines longer than `max_length` bytes.
///
/// An oversized line gets a `request` error, the rest of it is discarded up to the next newline.
pub async fn serve_with_limit<R, W>(
    reader: R,
    writer: W,
    addr: Addr<InspectionActor>,
    max_length: usize,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(max_length));
    let mut out = FramedWrite::new(writer, LinesCodec::new());
    let mut overflowed = false;

    loop {
        let line = match lines.next().await {
            Some(Ok(line)) => line,
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                let message = format!("request line exceeds {max_length} bytes");
                warn!("{message}");
                let response = Response::malformed(message);
                out.send(serde_json::to_string(&response)?).await?;
                overflowed = true;
                continue;
            }
            Some(Err(LinesCodecError::Io(e))) => return Err(e.into()),
            // the stream yields a single `None` right after a decode error
            None if overflowed => {
                overflowed = false;
                continue;
            }
            None => break,
        };
        overflowed = false;

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(req) => dispatch(&addr, req).await?,
            Err(e) => {
                warn!("malformed request: {e}");
                Response::malformed(e.to_string())
            }
        };

        out.send(serde_json::to_string(&response)?).await?;
    }

    debug!("request stream closed");
    Ok(())
}

async fn dispatch(addr: &Addr<InspectionActor>, req: Request) -> Result<Response> {
    let response = match req {
        Request::Train {
            training_records,
            testing_records,
            training_period,
            testing_period,
        } => {
            let msg = actor::Train {
                training_records,
                testing_records,
                training_period,
                testing_period,
            };

            match addr.send(msg).await? {
                Ok(metrics) => Response::ok(&metrics)?,
                Err(e) => e.into(),
            }
        }
        Request::SimulationCount {
            simulation_period,
            simulation_records,
        } => {
            let msg = actor::CountSimulation {
                period: simulation_period,
                records: simulation_records,
            };

            Response::ok(&addr.send(msg).await?)?
        }
        Request::PredictNext {
            simulation_period,
            simulation_records,
        } => {
            let msg = actor::PredictNext {
                period: simulation_period,
                records: simulation_records,
            };

            match addr.send(msg).await? {
                Ok(prediction) => Response::ok(&prediction)?,
                Err(e) => e.into(),
            }
        }
        Request::Status => Response::ok(&addr.send(actor::QueryStatus).await?)?,
        Request::Reset => {
            addr.send(actor::Reset).await?;
            Response::ok(&())?
        }
        Request::Summarize { records } => {
            Response::ok(&addr.send(actor::Summarize(records)).await?)?
        }
    };

    Ok(response)
}
