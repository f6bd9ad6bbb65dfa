use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use billdesk_core::{Aggregate, AggregateId, AggregateRoot, AuditStamp, DomainError};
use billdesk_events::{Command, Event};

/// Client identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub AggregateId);

impl ClientId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ClientId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Contact information for a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

impl billdesk_core::ValueObject for ContactInfo {}

/// Aggregate root: a client of the billing office.
///
/// Only `business_name` is required; everything else is optional because the
/// registry accumulates detail over time (a client may be registered from
/// nothing but a company name on an invoice). `state` doubles as the tax
/// jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    id: ClientId,
    business_name: String,
    contact_name: Option<String>,
    contact: ContactInfo,
    state: Option<String>,
    zipcode: Option<String>,
    industry: Option<String>,
    notes: Option<String>,
    audit: Option<AuditStamp>,
    version: u64,
    created: bool,
}

impl Client {
    /// Create an empty, not-yet-registered aggregate instance for rehydration.
    pub fn empty(id: ClientId) -> Self {
        Self {
            id,
            business_name: String::new(),
            contact_name: None,
            contact: ContactInfo::default(),
            state: None,
            zipcode: None,
            industry: None,
            notes: None,
            audit: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ClientId {
        self.id
    }

    pub fn business_name(&self) -> &str {
        &self.business_name
    }

    pub fn contact_name(&self) -> Option<&str> {
        self.contact_name.as_deref()
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn zipcode(&self) -> Option<&str> {
        self.zipcode.as_deref()
    }

    pub fn industry(&self) -> Option<&str> {
        self.industry.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn audit(&self) -> Option<&AuditStamp> {
        self.audit.as_ref()
    }

    /// Tax jurisdiction for this client: the state code, trimmed.
    ///
    /// Blank states count as no jurisdiction, so the tax resolver's
    /// default-rate fast path applies.
    pub fn jurisdiction(&self) -> Option<&str> {
        self.state
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn is_registered(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Client {
    type Id = ClientId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterClient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterClient {
    pub client_id: ClientId,
    pub business_name: String,
    pub contact_name: Option<String>,
    pub contact: Option<ContactInfo>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub industry: Option<String>,
    pub notes: Option<String>,
    pub audit: AuditStamp,
}

/// Command: UpdateClientDetails.
///
/// Every field except the id and the audit stamp is optional; `None` keeps
/// the existing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateClientDetails {
    pub client_id: ClientId,
    pub business_name: Option<String>,
    pub contact_name: Option<String>,
    pub contact: Option<ContactInfo>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub industry: Option<String>,
    pub notes: Option<String>,
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientCommand {
    RegisterClient(RegisterClient),
    UpdateClientDetails(UpdateClientDetails),
}

impl Command for ClientCommand {
    fn target_aggregate_id(&self) -> AggregateId {
        match self {
            ClientCommand::RegisterClient(cmd) => cmd.client_id.0,
            ClientCommand::UpdateClientDetails(cmd) => cmd.client_id.0,
        }
    }
}

/// Event: ClientRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRegistered {
    pub client_id: ClientId,
    pub business_name: String,
    pub contact_name: Option<String>,
    pub contact: ContactInfo,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub industry: Option<String>,
    pub notes: Option<String>,
    pub audit: AuditStamp,
}

/// Event: ClientDetailsUpdated.
///
/// Carries the full post-merge snapshot rather than a delta, so read models
/// can overwrite their row without loading prior state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetailsUpdated {
    pub client_id: ClientId,
    pub business_name: String,
    pub contact_name: Option<String>,
    pub contact: ContactInfo,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub industry: Option<String>,
    pub notes: Option<String>,
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientEvent {
    ClientRegistered(ClientRegistered),
    ClientDetailsUpdated(ClientDetailsUpdated),
}

impl Event for ClientEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::ClientRegistered(_) => "clients.client.registered",
            ClientEvent::ClientDetailsUpdated(_) => "clients.client.updated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ClientEvent::ClientRegistered(e) => e.audit.modified_date,
            ClientEvent::ClientDetailsUpdated(e) => e.audit.modified_date,
        }
    }
}

impl Aggregate for Client {
    type Command = ClientCommand;
    type Event = ClientEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ClientEvent::ClientRegistered(e) => {
                self.id = e.client_id;
                self.business_name = e.business_name.clone();
                self.contact_name = e.contact_name.clone();
                self.contact = e.contact.clone();
                self.state = e.state.clone();
                self.zipcode = e.zipcode.clone();
                self.industry = e.industry.clone();
                self.notes = e.notes.clone();
                self.audit = Some(e.audit.clone());
                self.created = true;
            }
            ClientEvent::ClientDetailsUpdated(e) => {
                self.business_name = e.business_name.clone();
                self.contact_name = e.contact_name.clone();
                self.contact = e.contact.clone();
                self.state = e.state.clone();
                self.zipcode = e.zipcode.clone();
                self.industry = e.industry.clone();
                self.notes = e.notes.clone();
                self.audit = Some(e.audit.clone());
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ClientCommand::RegisterClient(cmd) => self.handle_register(cmd),
            ClientCommand::UpdateClientDetails(cmd) => self.handle_update(cmd),
        }
    }
}

impl Client {
    fn ensure_client_id(&self, client_id: ClientId) -> Result<(), DomainError> {
        if self.id != client_id {
            return Err(DomainError::invariant("client_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterClient) -> Result<Vec<ClientEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("client already registered"));
        }

        if cmd.business_name.trim().is_empty() {
            return Err(DomainError::validation("business_name cannot be empty"));
        }

        let contact = cmd.contact.clone().unwrap_or_default();

        Ok(vec![ClientEvent::ClientRegistered(ClientRegistered {
            client_id: cmd.client_id,
            business_name: cmd.business_name.clone(),
            contact_name: cmd.contact_name.clone(),
            contact,
            state: cmd.state.clone(),
            zipcode: cmd.zipcode.clone(),
            industry: cmd.industry.clone(),
            notes: cmd.notes.clone(),
            audit: cmd.audit.clone(),
        })])
    }

    fn handle_update(&self, cmd: &UpdateClientDetails) -> Result<Vec<ClientEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_client_id(cmd.client_id)?;

        let new_business_name = cmd
            .business_name
            .clone()
            .unwrap_or_else(|| self.business_name.clone());
        if new_business_name.trim().is_empty() {
            return Err(DomainError::validation("business_name cannot be empty"));
        }

        let new_contact_name = cmd.contact_name.clone().or_else(|| self.contact_name.clone());
        let new_contact = cmd.contact.clone().unwrap_or_else(|| self.contact.clone());
        let new_state = cmd.state.clone().or_else(|| self.state.clone());
        let new_zipcode = cmd.zipcode.clone().or_else(|| self.zipcode.clone());
        let new_industry = cmd.industry.clone().or_else(|| self.industry.clone());
        let new_notes = cmd.notes.clone().or_else(|| self.notes.clone());

        Ok(vec![ClientEvent::ClientDetailsUpdated(
            ClientDetailsUpdated {
                client_id: cmd.client_id,
                business_name: new_business_name,
                contact_name: new_contact_name,
                contact: new_contact,
                state: new_state,
                zipcode: new_zipcode,
                industry: new_industry,
                notes: new_notes,
                audit: cmd.audit.clone(),
            },
        )])
    }
}
