//! Integration tests for the full billing pipeline.
//!
//! Tests: Command → EventLog → EventBus → Projection → ReadModel
//!
//! Verifies:
//! - Commands produce events that update read models correctly
//! - Rejected commands leave the read models untouched
//! - Search and dashboard views work against real projected rows

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use std::sync::Arc;

    use billdesk_clients::{Client, ClientCommand, ClientId, ContactInfo, RegisterClient};
    use billdesk_core::{Aggregate, AggregateId, AuditStamp};
    use billdesk_events::{Command, EventBus, EventEnvelope, InMemoryEventBus};
    use billdesk_invoicing::{
        CreateInvoice, EditInvoice, Invoice, InvoiceCommand, InvoiceDraft, InvoiceId,
        InvoiceStatus, price_draft,
    };
    use billdesk_tax::{StaticRateTable, TaxResolver};

    use crate::command_dispatcher::{CommandDispatcher, DispatchError};
    use crate::event_log::{
        EventLog, InMemoryEventLog, PendingEvent, PublishingEventLog, RecordedEvent,
    };
    use crate::projections::{
        ClientDirectoryProjection, ClientRecord, DashboardProjection, InvoiceRecord,
        InvoiceRecordsProjection,
    };
    use crate::read_model::InMemoryRecordStore;
    use crate::search::{RecordQuery, filter_records, quick_search_clients};

    type Bus = Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>>;
    type RecordsProjection =
        Arc<InvoiceRecordsProjection<Arc<InMemoryRecordStore<InvoiceId, InvoiceRecord>>>>;
    type DirectoryProjection =
        Arc<ClientDirectoryProjection<Arc<InMemoryRecordStore<ClientId, ClientRecord>>>>;

    fn test_invoice_id() -> InvoiceId {
        InvoiceId::new(AggregateId::new())
    }

    fn test_client_id() -> ClientId {
        ClientId::new(AggregateId::new())
    }

    fn test_stamp(who: &str) -> AuditStamp {
        AuditStamp::new(who, Utc::now())
    }

    fn setup() -> (
        CommandDispatcher<Arc<InMemoryEventLog>, Bus>,
        Arc<InMemoryEventLog>,
        RecordsProjection,
        DirectoryProjection,
    ) {
        billdesk_observability::init();

        let log = Arc::new(InMemoryEventLog::new());
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let dispatcher = CommandDispatcher::new(log.clone(), bus.clone());

        let records: RecordsProjection = Arc::new(InvoiceRecordsProjection::new(Arc::new(
            InMemoryRecordStore::new(),
        )));
        let directory: DirectoryProjection = Arc::new(ClientDirectoryProjection::new(Arc::new(
            InMemoryRecordStore::new(),
        )));

        // Subscribe to the bus BEFORE any events are published
        let records_clone = records.clone();
        let directory_clone = directory.clone();
        let bus_clone = bus.clone();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<()>();
        std::thread::spawn(move || {
            let sub = bus_clone.subscribe();
            let _ = ready_tx.send(());
            loop {
                match sub.recv() {
                    Ok(env) => {
                        if let Err(e) = records_clone.apply_envelope(&env) {
                            tracing::warn!("invoice records projection rejected envelope: {e:?}");
                        }
                        if let Err(e) = directory_clone.apply_envelope(&env) {
                            tracing::warn!("client directory projection rejected envelope: {e:?}");
                        }
                    }
                    Err(_) => break,
                }
            }
        });
        // Ensure subscriber is ready before returning (prevents missing early events).
        let _ = ready_rx.recv_timeout(std::time::Duration::from_secs(1));

        (dispatcher, log, records, directory)
    }

    /// Helper: wait a short time for events to be processed.
    /// The subscriber thread processes events synchronously.
    fn wait_for_processing() {
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    fn create_invoice_cmd(invoice_id: InvoiceId, business_name: &str) -> CreateInvoice {
        CreateInvoice {
            invoice_id,
            client_id: None,
            business_name: business_name.to_string(),
            service: "Consulting".to_string(),
            amount_usd: 100.0,
            tax_rate: Some(8.0),
            discount_percent: Some(10.0),
            status: InvoiceStatus::Pending,
            notes: None,
            audit: test_stamp("jdoe"),
        }
    }

    fn dispatch_create(
        dispatcher: &CommandDispatcher<Arc<InMemoryEventLog>, Bus>,
        cmd: CreateInvoice,
    ) -> Result<Vec<RecordedEvent>, DispatchError> {
        let command = InvoiceCommand::CreateInvoice(cmd);
        dispatcher.dispatch(
            command.target_aggregate_id(),
            "invoicing.invoice",
            command,
            |id| Invoice::empty(InvoiceId::new(id)),
        )
    }

    fn dispatch_edit(
        dispatcher: &CommandDispatcher<Arc<InMemoryEventLog>, Bus>,
        cmd: EditInvoice,
    ) -> Result<Vec<RecordedEvent>, DispatchError> {
        let command = InvoiceCommand::EditInvoice(cmd);
        dispatcher.dispatch(
            command.target_aggregate_id(),
            "invoicing.invoice",
            command,
            |id| Invoice::empty(InvoiceId::new(id)),
        )
    }

    #[test]
    fn create_invoice_builds_a_record_row() {
        let (dispatcher, _log, records, _) = setup();
        let invoice_id = test_invoice_id();

        let recorded =
            dispatch_create(&dispatcher, create_invoice_cmd(invoice_id, "Acme Corp")).unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].sequence_number, 1);

        wait_for_processing();

        let row = records.get(&invoice_id).unwrap();
        assert_eq!(row.business_name, "Acme Corp");
        assert_eq!(row.tax_amount, 8.0);
        assert_eq!(row.discount_amount, 10.0);
        assert_eq!(row.final_total, 98.0);
        assert_eq!(row.tax_rate_applied, 8.0);
        assert_eq!(row.modified_by, "jdoe");
        assert_eq!(row.final_total_display(), "98.00");
    }

    #[test]
    fn edit_recomputes_every_derived_field_in_the_row() {
        let (dispatcher, _log, records, _) = setup();
        let invoice_id = test_invoice_id();

        dispatch_create(&dispatcher, create_invoice_cmd(invoice_id, "Acme Corp")).unwrap();
        wait_for_processing();

        let edit = EditInvoice {
            invoice_id,
            service: "Audit".to_string(),
            amount_usd: 200.0,
            tax_rate: None,
            discount_percent: None,
            status: InvoiceStatus::Paid,
            notes: Some("net 30".to_string()),
            audit: test_stamp("asmith"),
        };
        dispatch_edit(&dispatcher, edit).unwrap();
        wait_for_processing();

        let row = records.get(&invoice_id).unwrap();
        assert_eq!(row.service, "Audit");
        assert_eq!(row.amount_usd, 200.0);
        assert_eq!(row.tax_rate_applied, 8.0);
        assert_eq!(row.tax_amount, 16.0);
        assert_eq!(row.discount_amount, 0.0);
        assert_eq!(row.final_total, 216.0);
        assert_eq!(row.status, InvoiceStatus::Paid);
        assert_eq!(row.modified_by, "asmith");
        // Not part of the edit surface, carried from issue time.
        assert_eq!(row.business_name, "Acme Corp");
    }

    #[test]
    fn rejected_command_leaves_the_read_model_untouched() {
        let (dispatcher, log, records, _) = setup();
        let invoice_id = test_invoice_id();

        let cmd = CreateInvoice {
            amount_usd: -5.0,
            ..create_invoice_cmd(invoice_id, "Acme Corp")
        };
        let result = dispatch_create(&dispatcher, cmd);

        match result.unwrap_err() {
            DispatchError::Validation(msg) => assert!(msg.contains("negative")),
            e => panic!("Expected Validation, got: {e:?}"),
        }

        wait_for_processing();

        assert!(records.get(&invoice_id).is_none());
        assert_eq!(log.total_events(), 0);
    }

    #[test]
    fn duplicate_create_is_a_conflict() {
        let (dispatcher, _log, _, _) = setup();
        let invoice_id = test_invoice_id();

        dispatch_create(&dispatcher, create_invoice_cmd(invoice_id, "Acme Corp")).unwrap();
        let result = dispatch_create(&dispatcher, create_invoice_cmd(invoice_id, "Acme Corp"));

        match result.unwrap_err() {
            DispatchError::Conflict(_) => {}
            e => panic!("Expected Conflict, got: {e:?}"),
        }
    }

    #[test]
    fn client_registration_fills_the_directory() {
        let (dispatcher, _log, _, directory) = setup();
        let client_id = test_client_id();

        let cmd = RegisterClient {
            client_id,
            business_name: "Globex".to_string(),
            contact_name: Some("Sam Lee".to_string()),
            contact: Some(ContactInfo {
                email: Some("sam@globex.example".to_string()),
                phone_number: Some("555-0142".to_string()),
                address: None,
            }),
            state: Some("NY".to_string()),
            zipcode: None,
            industry: None,
            notes: None,
            audit: test_stamp("jdoe"),
        };
        let command = ClientCommand::RegisterClient(cmd);
        dispatcher
            .dispatch(
                command.target_aggregate_id(),
                "clients.client",
                command,
                |id| Client::empty(ClientId::new(id)),
            )
            .unwrap();
        wait_for_processing();

        let row = directory.get(&client_id).unwrap();
        assert_eq!(row.business_name, "Globex");
        assert_eq!(row.phone_number.as_deref(), Some("555-0142"));
        assert_eq!(row.state.as_deref(), Some("NY"));

        let rows = directory.list();
        let hits = quick_search_clients(&rows, "globex");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn records_search_works_against_projected_rows() {
        let (dispatcher, _log, records, _) = setup();

        dispatch_create(
            &dispatcher,
            create_invoice_cmd(test_invoice_id(), "Acme Corp"),
        )
        .unwrap();
        dispatch_create(
            &dispatcher,
            CreateInvoice {
                service: "Payroll".to_string(),
                ..create_invoice_cmd(test_invoice_id(), "Acme West")
            },
        )
        .unwrap();
        dispatch_create(&dispatcher, create_invoice_cmd(test_invoice_id(), "Globex")).unwrap();
        wait_for_processing();

        let rows = records.list();
        assert_eq!(rows.len(), 3);

        let query = RecordQuery {
            business_name: "acme".to_string(),
            service: "consult".to_string(),
            ..RecordQuery::default()
        };
        let hits = filter_records(&rows, &query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].business_name, "Acme Corp");
    }

    #[test]
    fn dashboard_rebuilds_from_the_log() {
        let (dispatcher, log, _, _) = setup();
        let pending_id = test_invoice_id();
        let paid_id = test_invoice_id();

        dispatch_create(&dispatcher, create_invoice_cmd(pending_id, "Acme Corp")).unwrap();
        dispatch_create(
            &dispatcher,
            CreateInvoice {
                amount_usd: 200.0,
                tax_rate: None,
                discount_percent: None,
                status: InvoiceStatus::Paid,
                ..create_invoice_cmd(paid_id, "Globex")
            },
        )
        .unwrap();

        // Dashboard comes up later and replays the log instead of the bus.
        let mut envelopes = Vec::new();
        for id in [pending_id, paid_id] {
            for recorded in log.load_stream(id.0).unwrap() {
                envelopes.push(recorded.to_envelope());
            }
        }

        let mut dashboard = DashboardProjection::new();
        dashboard.rebuild_from_scratch(envelopes).unwrap();

        let summary = dashboard.summary();
        assert_eq!(summary.pending_total, 98.0);
        assert_eq!(summary.paid_total, 216.0);
        assert_eq!(summary.overdue_total, 0.0);
        assert_eq!(dashboard.invoice_count(), 2);
    }

    #[test]
    fn publishing_log_broadcasts_after_append() {
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let sub = bus.subscribe();
        let log = PublishingEventLog::new(InMemoryEventLog::new(), bus);

        let invoice_id = test_invoice_id();
        let invoice = Invoice::empty(invoice_id);
        let events = invoice
            .handle(&InvoiceCommand::CreateInvoice(create_invoice_cmd(
                invoice_id, "Acme Corp",
            )))
            .unwrap();

        let pending = PendingEvent::from_typed(
            invoice_id.0,
            "invoicing.invoice",
            uuid::Uuid::now_v7(),
            &events[0],
        )
        .unwrap();
        let recorded = log.append(vec![pending]).unwrap();
        assert_eq!(recorded[0].sequence_number, 1);

        let envelope = sub
            .recv_timeout(std::time::Duration::from_secs(1))
            .expect("appended event should reach the bus");
        assert_eq!(envelope.aggregate_id(), invoice_id.0);
        assert_eq!(envelope.sequence_number(), 1);
    }

    #[test]
    fn form_style_json_draft_prices_like_a_numeric_one() {
        let resolver = TaxResolver::new(StaticRateTable::from_pairs([("NY", 8.875)]));

        // The edit form submits numbers as strings and leaves blanks empty.
        let form: InvoiceDraft = serde_json::from_value(serde_json::json!({
            "amount_usd": 100.0,
            "tax_rate": "8",
            "discount_percent": "",
            "jurisdiction": "NY",
        }))
        .unwrap();
        let numeric = InvoiceDraft {
            amount_usd: 100.0,
            tax_rate: Some(8.0),
            discount_percent: None,
            jurisdiction: Some("NY".to_string()),
        };

        assert_eq!(form, numeric);
        assert_eq!(
            price_draft(&form, &resolver).unwrap(),
            price_draft(&numeric, &resolver).unwrap()
        );

        // With no explicit rate the jurisdiction decides.
        let by_state: InvoiceDraft = serde_json::from_value(serde_json::json!({
            "amount_usd": 100.0,
            "tax_rate": "n/a",
            "jurisdiction": "NY",
        }))
        .unwrap();
        let totals = price_draft(&by_state, &resolver).unwrap();
        assert_eq!(totals.tax_rate_applied, 8.875);
    }
}
