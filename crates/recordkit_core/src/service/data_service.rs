//! Generic CRUD service over entity records.

use crate::filter::QueryFilter;
use crate::gateway::{Document, GatewayError, GatewaySession, PersistenceGateway, RecordQuery};
use crate::model::entity::{Entity, RecordId};
use crate::session::{DataError, DataResult, DataSession};
use log::{error, info};
use std::marker::PhantomData;
use std::time::Instant;

/// CRUD contract for one record type.
pub trait GeneralDataService<T> {
    /// Inserts a record without identity, otherwise updates the persisted row.
    ///
    /// Inserted records come back with their allocated identity.
    fn create_or_update(&mut self, record: T) -> DataResult<T>;

    /// Removes the persisted row of `record`.
    fn delete(&mut self, record: &T) -> DataResult<()>;

    /// Loads one record by identity.
    fn get_record(&mut self, id: RecordId) -> DataResult<T>;

    /// Lists records matching `filter`, optionally ordered by a property.
    fn get_records_list(
        &mut self,
        filter: &QueryFilter,
        order_by: Option<&str>,
        ascending: bool,
    ) -> DataResult<Vec<T>>;
}

/// [`GeneralDataService`] backed by a borrowed [`DataSession`].
///
/// Operations join the caller's open unit of work when there is one,
/// otherwise each runs in its own transaction.
pub struct EntityService<'s, G: PersistenceGateway, T> {
    session: &'s mut DataSession<G>,
    marker: PhantomData<fn() -> T>,
}

impl<'s, G: PersistenceGateway, T: Entity> EntityService<'s, G, T> {
    pub fn new(session: &'s mut DataSession<G>) -> Self {
        Self {
            session,
            marker: PhantomData,
        }
    }

    /// Underlying session, for caller-managed transactions.
    pub fn session(&mut self) -> &mut DataSession<G> {
        self.session
    }

    fn log_outcome<R>(&self, operation: &str, started_at: Instant, outcome: &DataResult<R>) {
        let duration_ms = started_at.elapsed().as_millis();
        match outcome {
            Ok(_) => info!(
                "event=record_{} module=service status=ok collection={} session_id={} \
                 duration_ms={}",
                operation,
                T::COLLECTION,
                self.session.id(),
                duration_ms
            ),
            Err(err) => error!(
                "event=record_{} module=service status=error collection={} session_id={} \
                 duration_ms={} error={}",
                operation,
                T::COLLECTION,
                self.session.id(),
                duration_ms,
                err
            ),
        }
    }
}

impl<G: PersistenceGateway, T: Entity> GeneralDataService<T> for EntityService<'_, G, T> {
    fn create_or_update(&mut self, record: T) -> DataResult<T> {
        let started_at = Instant::now();
        let operation = if record.id().is_some() {
            "update"
        } else {
            "create"
        };
        let outcome = self.session.in_unit_of_work(move |gateway| {
            let mut record = record;
            record.validate().map_err(DataError::Validation)?;
            match record.id() {
                Some(id) => {
                    let document = to_document(&record)?;
                    if !gateway.update(T::COLLECTION, id, document)? {
                        return Err(DataError::NotFound {
                            collection: T::COLLECTION,
                            id: Some(id),
                        });
                    }
                }
                None => {
                    let id = gateway.allocate_id(T::COLLECTION)?;
                    record.set_id(id);
                    let document = to_document(&record)?;
                    gateway.insert(T::COLLECTION, id, document)?;
                }
            }
            Ok(record)
        });
        self.log_outcome(operation, started_at, &outcome);
        outcome
    }

    fn delete(&mut self, record: &T) -> DataResult<()> {
        let started_at = Instant::now();
        let id = record.id();
        let outcome = self.session.in_unit_of_work(move |gateway| {
            let not_found = DataError::NotFound {
                collection: T::COLLECTION,
                id,
            };
            let id = id.ok_or_else(|| not_found.clone())?;
            if gateway.delete(T::COLLECTION, id)? {
                Ok(())
            } else {
                Err(not_found)
            }
        });
        self.log_outcome("delete", started_at, &outcome);
        outcome
    }

    fn get_record(&mut self, id: RecordId) -> DataResult<T> {
        let started_at = Instant::now();
        let outcome = self.session.in_unit_of_work(move |gateway| {
            match gateway.find(T::COLLECTION, id)? {
                Some(document) => from_document(document),
                None => Err(DataError::NotFound {
                    collection: T::COLLECTION,
                    id: Some(id),
                }),
            }
        });
        self.log_outcome("get", started_at, &outcome);
        outcome
    }

    fn get_records_list(
        &mut self,
        filter: &QueryFilter,
        order_by: Option<&str>,
        ascending: bool,
    ) -> DataResult<Vec<T>> {
        let started_at = Instant::now();
        let outcome = self.session.in_unit_of_work(|gateway| {
            if order_by.is_some_and(|property| property.trim().is_empty()) {
                return Err(DataError::Validation(
                    "order_by property must not be empty".to_string(),
                ));
            }
            let query = RecordQuery {
                filter,
                order_by,
                ascending,
            };
            gateway
                .query(T::COLLECTION, &query)?
                .into_iter()
                .map(from_document)
                .collect()
        });
        self.log_outcome("list", started_at, &outcome);
        outcome
    }
}

fn to_document<T: Entity>(record: &T) -> DataResult<Document> {
    let document = serde_json::to_value(record)
        .map_err(|err| DataError::Validation(format!("record cannot be serialized: {err}")))?;
    if !document.is_object() {
        return Err(DataError::Validation(format!(
            "records of `{}` must serialize to an object",
            T::COLLECTION
        )));
    }
    Ok(document)
}

fn from_document<T: Entity>(document: Document) -> DataResult<T> {
    serde_json::from_value(document)
        .map_err(|err| DataError::Persistence(GatewayError::InvalidDocument(err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::{to_document, EntityService, GeneralDataService};
    use crate::config::SessionConfig;
    use crate::gateway::MemoryGateway;
    use crate::model::entity::{Entity, RecordId};
    use crate::session::{DataError, DataSession, SessionState};
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tag {
        id: Option<RecordId>,
        name: String,
    }

    impl Entity for Tag {
        const COLLECTION: &'static str = "tags";

        fn id(&self) -> Option<RecordId> {
            self.id
        }

        fn set_id(&mut self, id: RecordId) {
            self.id = Some(id);
        }

        fn validate(&self) -> Result<(), String> {
            if self.name.trim().is_empty() {
                return Err("tag name must not be blank".to_string());
            }
            Ok(())
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Scalar(i64);

    impl Entity for Scalar {
        const COLLECTION: &'static str = "scalars";

        fn id(&self) -> Option<RecordId> {
            None
        }

        fn set_id(&mut self, _id: RecordId) {}
    }

    #[test]
    fn create_assigns_identity_and_update_keeps_it() {
        let mut session =
            DataSession::open(Arc::new(MemoryGateway::new()), &SessionConfig::new()).unwrap();
        let mut service = EntityService::<_, Tag>::new(&mut session);

        let created = service
            .create_or_update(Tag {
                id: None,
                name: "inbox".to_string(),
            })
            .unwrap();
        let id = created.id.unwrap();

        let renamed = service
            .create_or_update(Tag {
                name: "archive".to_string(),
                ..created
            })
            .unwrap();
        assert_eq!(renamed.id, Some(id));
        assert_eq!(service.get_record(id).unwrap().name, "archive");
    }

    #[test]
    fn validation_failure_leaves_session_ready() {
        let mut session =
            DataSession::open(Arc::new(MemoryGateway::new()), &SessionConfig::new()).unwrap();
        let mut service = EntityService::<_, Tag>::new(&mut session);

        let err = service
            .create_or_update(Tag {
                id: None,
                name: "  ".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, DataError::Validation(_)));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn non_object_records_are_rejected() {
        let err = to_document(&Scalar(3)).unwrap_err();
        assert!(matches!(err, DataError::Validation(_)));
    }
}
