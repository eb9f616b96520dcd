//----------------------------------------
// spending mod types
//----------------------------------------
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Spending shape. Each family has a fixed parameter schema, validated
/// when a [`SpendingSpec`] is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SpendingFamily {
    /// Lan-DeMets O'Brien-Fleming approximation; `rho = 1` is the classic
    /// form.
    LDOF { rho: f64 },
    /// Lan-DeMets Pocock approximation.
    LDPocock,
    /// Hwang-Shih-DeCani; `gamma` in [-40, 40].
    HSD { gamma: f64 },
    /// Kim-DeMets power family, `t^rho`.
    Power { rho: f64 },
    /// Anderson-Clark exponential family, `total^(t^-nu)`.
    Exponential { nu: f64 },
    /// Linear interpolation through `(0, 0)`, `(knots[i], proportions[i])`
    /// and `(1, 1)`, scaled by the total spend.
    PiecewiseLinear {
        knots: Vec<f64>,
        proportions: Vec<f64>,
    },
    #[serde(skip)]
    User(UserSpending),
}

/// Caller-supplied spending shape, `f(fraction, total_spend)`.
#[derive(Clone)]
pub struct UserSpending {
    pub(crate) name: String,
    pub(crate) f: Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>,
}

impl UserSpending {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        UserSpending {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for UserSpending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSpending")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Spending family plus the total error it distributes, and optionally
/// the spending time to use at each analysis instead of the information
/// fraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SpendingSpecInput")]
pub struct SpendingSpec {
    pub(crate) family: SpendingFamily,
    pub(crate) total_spend: f64,
    pub(crate) timing: Option<Vec<f64>>,
}

// Unchecked wire form of a SpendingSpec
#[derive(Deserialize)]
pub(crate) struct SpendingSpecInput {
    pub(crate) family: SpendingFamily,
    pub(crate) total_spend: f64,
    #[serde(default)]
    pub(crate) timing: Option<Vec<f64>>,
}
