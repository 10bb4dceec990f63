/*!
Profile-weighted cost model.

Every query builds one [`CostParams`] value and the engines fold each edge
through [`CostParams::edge_cost`]. Barrier coefficients are per-minute
weights layered on top of the base time weight `alpha`:

```text
cost(e) = time_min(e) * (alpha
                         + beta  * [stairs        and pcd_mode]
                         + gamma * [bad_pavement  and pcd_mode]
                         + delta * [flood_risk    and rain_on])
        + TRANSFER_PENALTY * [transfer]
```

Scaling the barrier terms with the edge's nominal time makes a long
staircase-ridden segment proportionally worse than a short one, and makes
any barrier edge strongly discouraged for the profiles it penalises
without ever disconnecting the graph. All coefficients are validated
finite and nonnegative, which keeps every edge cost nonnegative.
*/

use serde::Serialize;

use crate::graph::Edge;
use crate::Error;

/// Flat surcharge applied once per service-boundary edge, covering the
/// effort of disembarking and boarding again. Expressed in cost units on
/// the same scale as `alpha * time_min`.
pub const TRANSFER_PENALTY: f64 = 2.0;

/// Per-minute weights of one mobility profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileWeights {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
}

/// Named mobility class. The coefficient table below is the sole source of
/// truth for profile weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Standard,
    Elderly,
    Pcd,
}

impl Profile {
    pub const ALL: [Self; 3] = [Self::Standard, Self::Elderly, Self::Pcd];

    pub fn parse(name: &str) -> Result<Self, Error> {
        match name {
            "standard" => Ok(Self::Standard),
            "elderly" => Ok(Self::Elderly),
            "pcd" => Ok(Self::Pcd),
            other => Err(Error::UnknownProfile(other.to_string())),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Elderly => "elderly",
            Self::Pcd => "pcd",
        }
    }

    /// Coefficient tuple for this profile.
    ///
    /// Stairs and pavement weights are gated by `pcd_mode` in the cost
    /// formula, so the elderly profile's intermediate `beta`/`gamma` are
    /// carried in the table but do not fire; this mirrors the historical
    /// behaviour of the system the table was taken from.
    #[must_use]
    pub const fn weights(self) -> ProfileWeights {
        match self {
            Self::Standard => ProfileWeights { alpha: 6.0, beta: 2.0, gamma: 1.0, delta: 4.0 },
            Self::Elderly => ProfileWeights { alpha: 6.0, beta: 4.0, gamma: 2.0, delta: 4.0 },
            Self::Pcd => ProfileWeights { alpha: 6.0, beta: 12.0, gamma: 6.0, delta: 4.0 },
        }
    }

    /// Cost parameters for this profile under the given weather.
    #[must_use]
    pub fn params(self, rain: bool) -> CostParams {
        let w = self.weights();
        CostParams {
            alpha: w.alpha,
            beta: w.beta,
            gamma: w.gamma,
            delta: w.delta,
            rain_on: rain,
            pcd_mode: matches!(self, Self::Pcd),
        }
    }
}

/// Scalar cost parameters of a single query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
    pub rain_on: bool,
    pub pcd_mode: bool,
}

impl CostParams {
    /// Validating constructor for custom coefficient tuples. Profile-based
    /// queries should go through [`profile_params`] instead.
    pub fn new(
        alpha: f64,
        beta: f64,
        gamma: f64,
        delta: f64,
        rain_on: bool,
        pcd_mode: bool,
    ) -> Result<Self, Error> {
        for (name, value) in [("alpha", alpha), ("beta", beta), ("gamma", gamma), ("delta", delta)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "coefficient {name} must be finite and nonnegative, got {value}"
                )));
            }
        }
        Ok(Self { alpha, beta, gamma, delta, rain_on, pcd_mode })
    }

    /// Scalar cost of traversing `edge` under these parameters.
    #[must_use]
    pub fn edge_cost(&self, edge: &Edge) -> f64 {
        let mut per_min = self.alpha;
        if self.pcd_mode {
            if edge.stairs {
                per_min += self.beta;
            }
            if edge.bad_pavement {
                per_min += self.gamma;
            }
        }
        if self.rain_on && edge.flood_risk {
            per_min += self.delta;
        }

        let mut cost = edge.time_min * per_min;
        if edge.transfer {
            cost += TRANSFER_PENALTY;
        }
        cost
    }
}

/// Looks up a profile by name and returns its cost parameters.
pub fn profile_params(name: &str, rain: bool) -> Result<CostParams, Error> {
    Ok(Profile::parse(name)?.params(rain))
}
