//! Return/redelivery protocol (protocolo de devolução/reentrega)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::service::split_composite;

/// Fields captured by the registration form, before the store assigns an id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProtocol {
    pub route: String,                   // rota
    pub driver: String,                  // motorista
    pub carrier: String,                 // transportadora
    pub order: Option<String>,           // pedido
    pub shipment: Option<String>,        // remessa
    pub invoice: Option<String>,         // nota fiscal
    pub reason: Option<String>,          // motivo
    pub registered_on: Option<NaiveDate>, // data de registro
}

impl NewProtocol {
    pub fn new(
        route: impl Into<String>,
        driver: impl Into<String>,
        carrier: impl Into<String>,
    ) -> Self {
        Self {
            route: route.into(),
            driver: driver.into(),
            carrier: carrier.into(),
            ..Default::default()
        }
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn with_shipment(mut self, shipment: impl Into<String>) -> Self {
        self.shipment = Some(shipment.into());
        self
    }

    pub fn with_invoice(mut self, invoice: impl Into<String>) -> Self {
        self.invoice = Some(invoice.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.registered_on = Some(date);
        self
    }

    /// Attach the identifier assigned by the store
    pub fn with_id(self, id: i32) -> ProtocolRecord {
        ProtocolRecord {
            id,
            route: self.route,
            driver: self.driver,
            carrier: self.carrier,
            order: self.order,
            shipment: self.shipment,
            invoice: self.invoice,
            reason: self.reason,
            registered_on: self.registered_on,
        }
    }
}

/// A stored protocol row. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolRecord {
    pub id: i32,
    pub route: String,
    pub driver: String,
    pub carrier: String,
    pub order: Option<String>,
    pub shipment: Option<String>,
    pub invoice: Option<String>,
    pub reason: Option<String>,
    pub registered_on: Option<NaiveDate>,
}

impl ProtocolRecord {
    /// Strip the identifier, leaving the fields as they were submitted
    pub fn to_new(&self) -> NewProtocol {
        NewProtocol {
            route: self.route.clone(),
            driver: self.driver.clone(),
            carrier: self.carrier.clone(),
            order: self.order.clone(),
            shipment: self.shipment.clone(),
            invoice: self.invoice.clone(),
            reason: self.reason.clone(),
            registered_on: self.registered_on,
        }
    }

    pub fn order_parts(&self) -> Vec<String> {
        split_composite(self.order.as_deref().unwrap_or_default())
    }

    pub fn shipment_parts(&self) -> Vec<String> {
        split_composite(self.shipment.as_deref().unwrap_or_default())
    }

    pub fn invoice_parts(&self) -> Vec<String> {
        split_composite(self.invoice.as_deref().unwrap_or_default())
    }
}
