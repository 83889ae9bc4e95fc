// Typed indicator periods, parsed once from caller overrides
use super::{Bollinger, Ema, IndicatorCalculator, Macd, Rsi, Sma, Stochastic};
use crate::error::{EngineError, Result};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerParams {
    pub period: usize,
    pub std_dev: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticParams {
    pub k: usize,
    pub d: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPeriods {
    pub sma: Vec<usize>,
    pub ema: Vec<usize>,
    pub macd: MacdParams,
    pub rsi: usize,
    pub bollinger: BollingerParams,
    pub stochastic: StochasticParams,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        IndicatorPeriods {
            sma: vec![20, 50],
            ema: vec![12, 26],
            macd: MacdParams { fast: 12, slow: 26, signal: 9 },
            rsi: 14,
            bollinger: BollingerParams { period: 20, std_dev: 2.0 },
            stochastic: StochasticParams { k: 14, d: 3 },
        }
    }
}

/// Which parameter an override key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverrideTarget {
    Sma(u32),
    Ema(u32),
    Rsi,
    Bollinger,
    MacdFast,
    MacdSlow,
    MacdSignal,
    StochK,
    StochD,
}

impl OverrideTarget {
    /// `<indicator>_period` or `<indicator>_period_<n>`; anything else is not an override.
    fn parse(key: &str) -> Option<Self> {
        let (indicator, instance) = match key.strip_suffix("_period") {
            Some(indicator) => (indicator, 0),
            None => {
                let (indicator, n) = key.split_once("_period_")?;
                (indicator, n.parse::<u32>().ok()?)
            }
        };
        let target = match indicator {
            "sma" => OverrideTarget::Sma(instance),
            "ema" => OverrideTarget::Ema(instance),
            "rsi" => OverrideTarget::Rsi,
            "bb" | "bollinger" => OverrideTarget::Bollinger,
            "macd_fast" => OverrideTarget::MacdFast,
            "macd_slow" => OverrideTarget::MacdSlow,
            "macd_signal" => OverrideTarget::MacdSignal,
            "stoch_k" => OverrideTarget::StochK,
            "stoch_d" => OverrideTarget::StochD,
            _ => return None,
        };
        Some(target)
    }
}

impl IndicatorPeriods {
    /// Validates caller overrides at the boundary. Unknown keys are ignored;
    /// a recognised key with a non-positive value is a malformed request.
    pub fn from_overrides(overrides: &BTreeMap<String, i64>) -> Result<Self> {
        let mut periods = IndicatorPeriods::default();
        let mut sma: Vec<(u32, usize)> = Vec::new();
        let mut ema: Vec<(u32, usize)> = Vec::new();

        for (key, &value) in overrides {
            let Some(target) = OverrideTarget::parse(key) else {
                tracing::debug!(key = %key, "Ignoring unrecognised indicator override");
                continue;
            };
            if value <= 0 {
                return Err(EngineError::InvalidParameter(format!(
                    "Indicator override '{}' must be a positive integer, got {}",
                    key, value
                )));
            }
            let period = value as usize;
            match target {
                OverrideTarget::Sma(instance) => sma.push((instance, period)),
                OverrideTarget::Ema(instance) => ema.push((instance, period)),
                OverrideTarget::Rsi => periods.rsi = period,
                OverrideTarget::Bollinger => periods.bollinger.period = period,
                OverrideTarget::MacdFast => periods.macd.fast = period,
                OverrideTarget::MacdSlow => periods.macd.slow = period,
                OverrideTarget::MacdSignal => periods.macd.signal = period,
                OverrideTarget::StochK => periods.stochastic.k = period,
                OverrideTarget::StochD => periods.stochastic.d = period,
            }
        }

        if !sma.is_empty() {
            periods.sma = ordered_unique(sma);
        }
        if !ema.is_empty() {
            periods.ema = ordered_unique(ema);
        }
        Ok(periods)
    }

    /// Parses raw string query parameters; values that are not integers are malformed.
    pub fn from_query<'a, I>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut overrides = BTreeMap::new();
        for (key, raw) in params {
            if OverrideTarget::parse(key).is_none() {
                continue;
            }
            let value = raw.trim().parse::<i64>().map_err(|e| {
                EngineError::InvalidParameter(format!("Indicator override '{}'='{}' is not an integer: {}", key, raw, e))
            })?;
            overrides.insert(key.to_string(), value);
        }
        Self::from_overrides(&overrides)
    }

    pub fn calculators(&self) -> Vec<Box<dyn IndicatorCalculator>> {
        let mut calculators: Vec<Box<dyn IndicatorCalculator>> = Vec::new();
        for &period in &self.sma {
            calculators.push(Box::new(Sma::new(period)));
        }
        for &period in &self.ema {
            calculators.push(Box::new(Ema::new(period)));
        }
        calculators.push(Box::new(Macd::new(self.macd.fast, self.macd.slow, self.macd.signal)));
        calculators.push(Box::new(Rsi::new(self.rsi)));
        calculators.push(Box::new(Bollinger::new(self.bollinger.period, self.bollinger.std_dev)));
        calculators.push(Box::new(Stochastic::new(self.stochastic.k, self.stochastic.d)));
        calculators
    }
}

fn ordered_unique(mut instances: Vec<(u32, usize)>) -> Vec<usize> {
    instances.sort_by_key(|(instance, _)| *instance);
    let mut periods = Vec::with_capacity(instances.len());
    for (_, period) in instances {
        if !periods.contains(&period) {
            periods.push(period);
        }
    }
    periods
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let periods = IndicatorPeriods::from_overrides(&BTreeMap::new()).unwrap();
        assert_eq!(periods, IndicatorPeriods::default());
        assert_eq!(periods.sma, vec![20, 50]);
        assert_eq!(periods.ema, vec![12, 26]);
        assert_eq!(periods.calculators().len(), 8);
    }

    #[test]
    fn test_multiple_sma_instances_ordered_by_number() {
        let periods = IndicatorPeriods::from_overrides(&overrides(&[
            ("sma_period_2", 100),
            ("sma_period_10", 7),
            ("sma_period_1", 10),
            ("sma_period_3", 10),
        ]))
        .unwrap();
        assert_eq!(periods.sma, vec![10, 100, 7]);
        // EMA untouched
        assert_eq!(periods.ema, vec![12, 26]);
    }

    #[test]
    fn test_singular_overrides() {
        let periods = IndicatorPeriods::from_overrides(&overrides(&[
            ("rsi_period", 7),
            ("bb_period", 10),
            ("macd_fast_period", 5),
            ("macd_slow_period", 35),
            ("macd_signal_period", 5),
            ("stoch_k_period", 5),
            ("stoch_d_period", 2),
            ("ema_period", 9),
        ]))
        .unwrap();
        assert_eq!(periods.rsi, 7);
        assert_eq!(periods.bollinger.period, 10);
        assert_eq!(periods.macd, MacdParams { fast: 5, slow: 35, signal: 5 });
        assert_eq!(periods.stochastic, StochasticParams { k: 5, d: 2 });
        assert_eq!(periods.ema, vec![9]);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let periods = IndicatorPeriods::from_overrides(&overrides(&[("pair", 1), ("vwap_period", 3), ("sma_period_x", 4)])).unwrap();
        assert_eq!(periods, IndicatorPeriods::default());
    }

    #[test]
    fn test_non_positive_value_is_client_error() {
        let err = IndicatorPeriods::from_overrides(&overrides(&[("rsi_period", 0)])).unwrap_err();
        assert!(err.is_client_error());
        let err = IndicatorPeriods::from_overrides(&overrides(&[("sma_period_1", -5)])).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_from_query_parses_strings() {
        let periods = IndicatorPeriods::from_query([("rsi_period", "21"), ("pair", "EUR/USD")]).unwrap();
        assert_eq!(periods.rsi, 21);
        let err = IndicatorPeriods::from_query([("rsi_period", "abc")]).unwrap_err();
        assert!(err.is_client_error());
    }
}
