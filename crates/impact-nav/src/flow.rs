//! Subscription purchase flow
//!
//! A strict prefix chain: package, then payment method, then payment data.
//! [`SubscriptionFlow::reduce`] is the pure transition function; the
//! convenience methods apply it in place.

use crate::error::FlowError;
use impact_access::PageId;
use serde::{Deserialize, Serialize};

/// Subscription package offered on the subscription page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Package identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Price in minor currency units
    pub price_cents: u64,
    /// Surveys included per billing period
    pub survey_quota: u32,
}

impl Package {
    /// Create a package
    pub fn new(id: impl Into<String>, name: impl Into<String>, price_cents: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price_cents,
            survey_quota: 0,
        }
    }

    /// With survey quota
    #[must_use]
    pub fn with_survey_quota(mut self, quota: u32) -> Self {
        self.survey_quota = quota;
        self
    }
}

/// How the package is paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Credit or debit card
    Card,
    /// Bank transfer
    BankTransfer,
    /// Mobile money wallet
    MobileMoney,
}

/// Payment data captured on the details page
///
/// Field validation happens in the form layer; this is the accepted result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPayload {
    /// Account or card holder
    pub holder: String,
    /// Masked card number, IBAN or wallet number
    pub reference: String,
    /// Amount charged in minor currency units
    pub amount_cents: u64,
}

/// Flow transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAction {
    /// Choose a package, invalidating later choices
    SelectPackage(Package),
    /// Choose a payment method
    SelectMethod(PaymentMethod),
    /// Submit payment data
    SubmitPayment(PaymentPayload),
    /// Step back from details to method, dropping payment data only
    ReturnToMethod,
    /// Clear everything
    Reset,
}

/// Subscription flow state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFlow {
    selected_package: Option<Package>,
    selected_method: Option<PaymentMethod>,
    payment_data: Option<PaymentPayload>,
}

impl SubscriptionFlow {
    /// Empty flow
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected package
    #[inline]
    #[must_use]
    pub fn selected_package(&self) -> Option<&Package> {
        self.selected_package.as_ref()
    }

    /// Selected payment method
    #[inline]
    #[must_use]
    pub fn selected_method(&self) -> Option<PaymentMethod> {
        self.selected_method
    }

    /// Submitted payment data
    #[inline]
    #[must_use]
    pub fn payment_data(&self) -> Option<&PaymentPayload> {
        self.payment_data.as_ref()
    }

    /// Whether nothing has been chosen
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected_package.is_none()
    }

    /// Whether the prefix chain holds
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        (self.selected_method.is_none() || self.selected_package.is_some())
            && (self.payment_data.is_none() || self.selected_method.is_some())
    }

    /// Next state after `action`; `self` is untouched
    ///
    /// # Errors
    /// - [`FlowError::PackageNotSelected`]: method chosen without a package
    /// - [`FlowError::MethodNotSelected`]: payment submitted without a method
    pub fn reduce(&self, action: FlowAction) -> Result<Self, FlowError> {
        match action {
            FlowAction::SelectPackage(package) => Ok(Self {
                selected_package: Some(package),
                selected_method: None,
                payment_data: None,
            }),
            FlowAction::SelectMethod(method) => {
                if self.selected_package.is_none() {
                    return Err(FlowError::PackageNotSelected);
                }
                Ok(Self {
                    selected_method: Some(method),
                    payment_data: None,
                    ..self.clone()
                })
            }
            FlowAction::SubmitPayment(payload) => {
                if self.selected_method.is_none() {
                    return Err(FlowError::MethodNotSelected);
                }
                Ok(Self {
                    payment_data: Some(payload),
                    ..self.clone()
                })
            }
            FlowAction::ReturnToMethod => Ok(Self {
                payment_data: None,
                ..self.clone()
            }),
            FlowAction::Reset => Ok(Self::default()),
        }
    }

    /// Apply `action` in place; on error the state is unchanged
    ///
    /// # Errors
    /// See [`SubscriptionFlow::reduce`]
    pub fn apply(&mut self, action: FlowAction) -> Result<(), FlowError> {
        *self = self.reduce(action)?;
        Ok(())
    }

    /// Choose a package
    pub fn select_package(&mut self, package: Package) {
        self.selected_package = Some(package);
        self.selected_method = None;
        self.payment_data = None;
    }

    /// Choose a payment method
    ///
    /// # Errors
    /// [`FlowError::PackageNotSelected`]
    pub fn select_method(&mut self, method: PaymentMethod) -> Result<(), FlowError> {
        self.apply(FlowAction::SelectMethod(method))
    }

    /// Submit payment data
    ///
    /// # Errors
    /// [`FlowError::MethodNotSelected`]
    pub fn submit_payment(&mut self, payload: PaymentPayload) -> Result<(), FlowError> {
        self.apply(FlowAction::SubmitPayment(payload))
    }

    /// Drop payment data, keeping package and method
    pub fn return_to_method(&mut self) {
        self.payment_data = None;
    }

    /// Clear all choices
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Earliest flow page whose prerequisites are missing for `page`
    ///
    /// `None` when `page` is not a flow page or its prerequisites hold.
    #[must_use]
    pub fn first_incomplete_step(&self, page: PageId) -> Option<PageId> {
        let required = match page {
            PageId::PaymentMethod => 1,
            PageId::PaymentDetails => 2,
            PageId::SubscriptionConfirmation => 3,
            _ => return None,
        };
        let completed = self.completed_steps();
        if completed >= required {
            return None;
        }
        Some(match completed {
            0 => PageId::Subscription,
            1 => PageId::PaymentMethod,
            _ => PageId::PaymentDetails,
        })
    }

    fn completed_steps(&self) -> u8 {
        match (&self.selected_package, self.selected_method, &self.payment_data) {
            (None, _, _) => 0,
            (Some(_), None, _) => 1,
            (Some(_), Some(_), None) => 2,
            (Some(_), Some(_), Some(_)) => 3,
        }
    }
}
