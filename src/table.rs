//! The ordered rule table and its evaluator.
//!
//! A [`RuleTable`] is append-only while building, then frozen. Evaluation
//! scans in table order and stops at the first rule that covers the queried
//! feature and matches the environment — there is no most-specific-wins
//! tie-break, rule authors order specific entries before general ones.
//!
//! Tables are immutable after [`RuleTableBuilder::freeze`]; evaluation is a
//! pure read and safe to run from any number of threads. If the rule set
//! ever needs replacing, build a fresh table and swap the reference — never
//! mutate one a reader might be scanning.

use tracing::{debug, info, warn};

use crate::environment::Environment;
use crate::rule::{
    driver_vendor_matches, window_protocol_matches, ConstructionError, Feature, FeatureStatus,
    RangePredicate, Rule,
};
use crate::version::{ComparisonOp, DriverVersion, VersionPadding};

// ─────────────────────────────────────────────────────────────────────────────
// Decision
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of evaluating one feature against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub feature: Feature,
    pub status: FeatureStatus,
    /// Driver version the matching rule suggests upgrading to.
    pub suggested_version: Option<String>,
    /// Id of the rule that decided, or `None` for the default outcome.
    pub rule_id: Option<String>,
}

impl Decision {
    /// True when the decided status turns the feature off or warns.
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Table
// ─────────────────────────────────────────────────────────────────────────────

/// Frozen, ordered collection of rules plus the version-interpretation
/// policy used for driver strings evaluated against it.
#[derive(Debug)]
pub struct RuleTable {
    rules: Vec<Rule>,
    padding: VersionPadding,
}

/// Append-only construction phase of a [`RuleTable`].
pub struct RuleTableBuilder {
    rules: Vec<Rule>,
    padding: VersionPadding,
}

impl RuleTable {
    pub fn builder(padding: VersionPadding) -> RuleTableBuilder {
        RuleTableBuilder {
            rules: Vec::new(),
            padding,
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn padding(&self) -> VersionPadding {
        self.padding
    }

    /// Evaluates one feature against the table.
    ///
    /// First match in table order wins. A driver version string that does
    /// not parse never aborts the query: version-bounded rules are simply
    /// skipped, because garbage version strings occur in the wild and must
    /// not break feature detection. `default_status` is returned with no
    /// rule id when nothing matches.
    pub fn evaluate(
        &self,
        env: &Environment,
        feature: Feature,
        default_status: FeatureStatus,
    ) -> Decision {
        let driver_version = if env.driver_version.is_empty() {
            None
        } else {
            match DriverVersion::parse(&env.driver_version, self.padding) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(error = %e, "Unparsable driver version, version-bounded rules skipped");
                    None
                }
            }
        };

        // OS build versions are honest integers on every platform.
        let os_version = if env.os_version.is_empty() {
            None
        } else {
            match DriverVersion::parse(&env.os_version, VersionPadding::None) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(error = %e, "Unparsable OS version, OS-version-bounded rules skipped");
                    None
                }
            }
        };

        for rule in &self.rules {
            if !rule.feature.covers(feature) {
                continue;
            }
            if rule_matches(rule, env, driver_version, os_version) {
                debug!(
                    rule_id = %rule.rule_id,
                    feature = feature.as_str(),
                    status = ?rule.status,
                    "Blocklist rule matched"
                );
                return Decision {
                    feature,
                    status: rule.status,
                    suggested_version: rule.suggested_version.clone(),
                    rule_id: Some(rule.rule_id.clone()),
                };
            }
        }

        Decision {
            feature,
            status: default_status,
            suggested_version: None,
            rule_id: None,
        }
    }
}

impl RuleTableBuilder {
    /// Appends a built rule, applying the construction-error policy: an
    /// invalid rule is a table-authoring bug, fatal in debug builds and
    /// dropped with a warning in release.
    pub fn push(&mut self, rule: Result<Rule, ConstructionError>) -> &mut Self {
        match rule {
            Ok(rule) => self.rules.push(rule),
            Err(e) => {
                debug_assert!(false, "invalid blocklist rule: {e}");
                warn!(error = %e, "Dropping invalid blocklist rule");
            }
        }
        self
    }

    /// Ends the construction phase.
    pub fn freeze(self) -> RuleTable {
        info!(
            rules = self.rules.len(),
            padding = ?self.padding,
            "Blocklist rule table frozen"
        );
        RuleTable {
            rules: self.rules,
            padding: self.padding,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Predicate evaluation
// ─────────────────────────────────────────────────────────────────────────────

/// Tests every predicate field of one rule, short-circuiting on the first
/// mismatch. The ordering is an optimization (cheap enum tests first),
/// not a semantic requirement.
fn rule_matches(
    rule: &Rule,
    env: &Environment,
    driver_version: Option<DriverVersion>,
    os_version: Option<DriverVersion>,
) -> bool {
    if !rule.os.matches(env.os) {
        return false;
    }
    if !rule.screen.matches(env.screen_size()) {
        return false;
    }
    if !rule.battery.matches(env.battery_present) {
        return false;
    }
    if !window_protocol_matches(&rule.window_protocol, &env.window_protocol) {
        return false;
    }
    if !rule.device_vendor.is_empty() && rule.device_vendor != env.device_vendor {
        return false;
    }
    if !driver_vendor_matches(&rule.driver_vendor, &env.driver_vendor) {
        return false;
    }
    if !rule.devices.contains(&env.device_id) {
        return false;
    }

    if rule.os_version_op != ComparisonOp::Ignored {
        let Some(os_version) = os_version else {
            return false;
        };
        if !os_version.satisfies(rule.os_version_op, rule.os_version_min, rule.os_version_max) {
            return false;
        }
    }

    match &rule.range {
        RangePredicate::DriverVersion { op, min, max } => {
            if *op != ComparisonOp::Ignored {
                let Some(version) = driver_version else {
                    return false;
                };
                if !version.satisfies(*op, *min, *max) {
                    return false;
                }
            }
        }
        RangePredicate::RefreshRate {
            status,
            min_op,
            min,
            min_max,
            max_op,
            max,
            max_max,
        } => {
            if !status.matches(env.refresh_rate_status) {
                return false;
            }
            if !min_op.compare_u32(env.min_refresh_rate, *min, *min_max) {
                return false;
            }
            if !max_op.compare_u32(env.max_refresh_rate, *max, *max_max) {
                return false;
            }
        }
    }

    // GPU2 rules only answer secondary-adapter queries and vice versa.
    rule.gpu2 == env.secondary_gpu
}
