use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{
    mpsc::{self, Sender, WeakSender},
    oneshot, watch,
};
use tracing::{error, info, warn};
use url::Url;

use crate::{
    entity::FitmentIndex,
    usecase::{CatalogFetcher, CatalogLoad, Handoff, HandoffError},
};

use super::{
    resolver::{resolve, Unresolved},
    selector::{Field, FieldPhase, SelectError, SelectorState},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Ready { type_name: String, vehicles: usize },
    /// Every candidate type name came back empty
    Empty,
    Failed(String),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub field: Field,
    pub phase: FieldPhase,
    pub value: Option<String>,
    pub options: Vec<String>,
}

/// Snapshot of the selector for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorView {
    pub status: LoadStatus,
    pub fields: Vec<FieldView>,
}

impl SelectorView {
    fn new(status: &LoadStatus, selector: &SelectorState) -> Self {
        Self {
            status: status.clone(),
            fields: Field::ALL
                .iter()
                .map(|field| FieldView {
                    field: *field,
                    phase: selector.phase(*field),
                    value: selector.value(*field).map(String::from),
                    options: selector.options(*field),
                })
                .collect(),
        }
    }

    pub fn field(&self, field: Field) -> &FieldView {
        // fields are built from Field::ALL in declaration order
        &self.fields[field as usize]
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error(transparent)]
    Unresolved(#[from] Unresolved),
    #[error(transparent)]
    Handoff(#[from] HandoffError),
    #[error("handoff task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("fitment session has stopped")]
    Closed,
}

pub enum FitmentEvent {
    // completed catalog load, tagged with the generation that started it
    CatalogLoaded(u64, Result<CatalogLoad, String>),
    View(oneshot::Sender<SelectorView>),
    Select(Field, String, oneshot::Sender<Result<SelectorView, SelectError>>),
    Clear(Field, oneshot::Sender<SelectorView>),
    Resolve(oneshot::Sender<Result<Url, SessionError>>),
    // drop the current index and fetch the catalog again, acked once loading
    Reload(oneshot::Sender<()>),
}

/// One selector session. The loop task owns the index and selector state;
/// every change arrives as a [`FitmentEvent`].
pub struct FitmentSession {
    fetcher: Arc<CatalogFetcher>,
    handoff: Arc<Handoff>,
}

impl FitmentSession {
    pub fn new(fetcher: Arc<CatalogFetcher>, handoff: Arc<Handoff>) -> Self {
        Self { fetcher, handoff }
    }

    /// Start the event loop and the initial catalog load.
    pub fn spawn(self) -> SessionHandle {
        let (tx, mut rx) = mpsc::channel::<FitmentEvent>(32);
        let (status_tx, status_rx) = watch::channel(LoadStatus::Loading);
        let weak_tx = tx.downgrade();

        tokio::spawn(async move {
            let mut index = FitmentIndex::default();
            let mut selector = SelectorState::locked();
            let mut status = LoadStatus::Loading;
            let mut generation: u64 = 0;

            start_load(self.fetcher.clone(), weak_tx.clone(), generation);

            while let Some(event) = rx.recv().await {
                match event {
                    FitmentEvent::CatalogLoaded(loaded, result) => {
                        if loaded != generation {
                            warn!("discarding stale catalog load {}", loaded);
                            continue;
                        }
                        // swap in a fully built index, never a partial one
                        (index, status) = match result {
                            Ok(load) => {
                                let next = FitmentIndex::build(load.records.iter());
                                let status = match load.type_name {
                                    Some(type_name) if !next.is_empty() => LoadStatus::Ready {
                                        type_name,
                                        vehicles: next.record_count(),
                                    },
                                    _ => LoadStatus::Empty,
                                };
                                (next, status)
                            }
                            Err(e) => {
                                error!("catalog load failed: {}", e);
                                (FitmentIndex::default(), LoadStatus::Failed(e))
                            }
                        };
                        selector = SelectorState::new(&index);
                        info!("fitment session {:?}", status);
                        status_tx.send_replace(status.clone());
                    }
                    FitmentEvent::View(tx) => {
                        let _ = tx.send(SelectorView::new(&status, &selector));
                    }
                    FitmentEvent::Select(field, value, tx) => {
                        let result = selector
                            .select(&index, field, &value)
                            .map(|_| SelectorView::new(&status, &selector));
                        let _ = tx.send(result);
                    }
                    FitmentEvent::Clear(field, tx) => {
                        selector.clear(&index, field);
                        let _ = tx.send(SelectorView::new(&status, &selector));
                    }
                    FitmentEvent::Resolve(tx) => {
                        let result = match resolve(&index, &selector) {
                            Ok(context) => {
                                // storage is file I/O, keep it off the runtime threads
                                let handoff = self.handoff.clone();
                                let applied =
                                    tokio::task::spawn_blocking(move || handoff.apply(&context))
                                        .await;
                                match applied {
                                    Ok(result) => result.map_err(SessionError::from),
                                    Err(e) => Err(e.into()),
                                }
                            }
                            Err(e) => {
                                info!("{}", e.detail());
                                Err(e.into())
                            }
                        };
                        let _ = tx.send(result);
                    }
                    FitmentEvent::Reload(tx) => {
                        generation += 1;
                        index = FitmentIndex::default();
                        selector = SelectorState::locked();
                        status = LoadStatus::Loading;
                        status_tx.send_replace(status.clone());
                        start_load(self.fetcher.clone(), weak_tx.clone(), generation);
                        let _ = tx.send(());
                    }
                }
            }
        });

        SessionHandle { tx, status_rx }
    }
}

fn start_load(fetcher: Arc<CatalogFetcher>, tx: WeakSender<FitmentEvent>, generation: u64) {
    tokio::spawn(async move {
        let result = fetcher.load_catalog().await.map_err(|e| e.to_string());
        // every handle is gone, nobody is waiting for this catalog
        let Some(tx) = tx.upgrade() else {
            return;
        };
        if let Err(e) = tx.send(FitmentEvent::CatalogLoaded(generation, result)).await {
            error!("catalog loaded tx error: {}", e);
        }
    });
}

/// Cloneable handle to a running [`FitmentSession`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Sender<FitmentEvent>,
    status_rx: watch::Receiver<LoadStatus>,
}

impl SessionHandle {
    pub async fn view(&self) -> Result<SelectorView, SessionError> {
        self.request(FitmentEvent::View).await
    }

    pub async fn select(
        &self,
        field: Field,
        value: impl Into<String>,
    ) -> Result<SelectorView, SessionError> {
        let value = value.into();
        Ok(self
            .request(|tx| FitmentEvent::Select(field, value, tx))
            .await??)
    }

    pub async fn clear(&self, field: Field) -> Result<SelectorView, SessionError> {
        self.request(|tx| FitmentEvent::Clear(field, tx)).await
    }

    /// Resolve the current selection, persist it and return the catalog URL.
    pub async fn resolve(&self) -> Result<Url, SessionError> {
        self.request(FitmentEvent::Resolve).await?
    }

    /// Returns once the session is back to [`LoadStatus::Loading`].
    pub async fn reload(&self) -> Result<(), SessionError> {
        self.request(FitmentEvent::Reload).await
    }

    /// Wait until the in-flight catalog load has finished, successfully or not.
    pub async fn loaded(&self) -> Result<SelectorView, SessionError> {
        let mut status_rx = self.status_rx.clone();
        status_rx
            .wait_for(|status| !status.is_loading())
            .await
            .map_err(|_| SessionError::Closed)?;
        self.view().await
    }

    async fn request<T>(
        &self,
        event: impl FnOnce(oneshot::Sender<T>) -> FitmentEvent,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(event(tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}
