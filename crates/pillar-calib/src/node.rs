//! Curve nodes and instrument templates.
//!
//! A [`CurveNode`] ties one point of a curve to one market quote through an
//! [`InstrumentTemplate`]. Templates carry tenors and conventions; resolving
//! a node against a valuation date and a quote snapshot produces the fully
//! dated [`ResolvedInstrument`] plus the node's pillar date.
//!
//! Schedules generated here step whole months from the start date (the
//! calendar-adjusted variant belongs to the upstream conventions layer).

use pillar_core::daycounts::DayCountConvention;
use pillar_core::{Currency, CurrencyPair, Date, Frequency, Tenor};
use pillar_curves::RateIndex;

use crate::error::{CalibError, CalibResult};
use crate::instruments::{
    Deposit, FixedPeriod, FloatingLeg, FloatingPeriod, Fra, FxSwap, IborFixingDeposit,
    ResolvedInstrument, Swap, XccyBasisSwap,
};
use crate::quotes::{MarketQuotes, QuoteId};

/// Template of a calibration instrument, prior to resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentTemplate {
    /// Cash deposit starting at the valuation date.
    Deposit {
        /// Deposit currency.
        currency: Currency,
        /// Deposit tenor.
        tenor: Tenor,
        /// Accrual day count.
        day_count: DayCountConvention,
    },
    /// Spot fixing of a term index (deposit over the index tenor).
    IborFixing {
        /// The referenced index.
        index: RateIndex,
        /// Accrual day count.
        day_count: DayCountConvention,
    },
    /// Forward rate agreement over one index period.
    Fra {
        /// The projected index.
        index: RateIndex,
        /// Months from the valuation date to the forward period start.
        start_months: u32,
        /// Accrual day count.
        day_count: DayCountConvention,
    },
    /// Fixed-for-floating swap on a term index.
    Swap {
        /// The floating leg index.
        index: RateIndex,
        /// Swap tenor.
        tenor: Tenor,
        /// Fixed leg payment frequency.
        fixed_frequency: Frequency,
        /// Fixed leg day count.
        fixed_day_count: DayCountConvention,
    },
    /// Overnight index swap with annual fixed payments.
    Ois {
        /// The overnight index.
        index: RateIndex,
        /// Swap tenor.
        tenor: Tenor,
        /// Fixed leg day count.
        day_count: DayCountConvention,
    },
    /// FX swap quoted in forward points.
    FxSwap {
        /// Currency pair.
        pair: CurrencyPair,
        /// Tenor to the far date.
        tenor: Tenor,
    },
    /// Cross-currency basis swap, quarterly overnight legs.
    XccyBasisSwap {
        /// Spread (foreign) leg index.
        spread_index: RateIndex,
        /// Flat (domestic) leg index.
        flat_index: RateIndex,
        /// Swap tenor.
        tenor: Tenor,
        /// Day count of both floating legs.
        day_count: DayCountConvention,
    },
}

/// One calibration point: an instrument template bound to a quote id.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveNode {
    /// The instrument template.
    pub template: InstrumentTemplate,
    /// The market quote the node calibrates to.
    pub quote_id: QuoteId,
}

impl CurveNode {
    /// Creates a curve node.
    #[must_use]
    pub fn new(template: InstrumentTemplate, quote_id: impl Into<QuoteId>) -> Self {
        Self {
            template,
            quote_id: quote_id.into(),
        }
    }

    /// Resolves the node against a valuation date and quote snapshot.
    ///
    /// Returns the resolved instrument and its pillar date (the date the
    /// node's x-value is derived from).
    ///
    /// # Errors
    ///
    /// Returns `CalibError::MissingQuote` if the quote is absent and
    /// invalid-instrument errors for unresolvable dates.
    pub fn resolve(
        &self,
        valuation_date: Date,
        quotes: &MarketQuotes,
    ) -> CalibResult<(ResolvedInstrument, Date)> {
        let quote = quotes.value(&self.quote_id)?;
        let context = self.quote_id.to_string();
        let date_err =
            |e: pillar_core::CoreError| CalibError::invalid_instrument(&context, e.to_string());

        match &self.template {
            InstrumentTemplate::Deposit {
                currency,
                tenor,
                day_count,
            } => {
                let end = tenor.add_to(valuation_date).map_err(date_err)?;
                let instrument = ResolvedInstrument::Deposit(Deposit {
                    currency: *currency,
                    start: valuation_date,
                    end,
                    accrual_factor: day_count.year_fraction_f64(valuation_date, end),
                    rate: quote,
                    notional: 1.0,
                });
                Ok((instrument, end))
            }
            InstrumentTemplate::IborFixing { index, day_count } => {
                let tenor = index.tenor().ok_or_else(|| {
                    CalibError::invalid_instrument(&context, "fixing requires a term index")
                })?;
                let end = tenor.add_to(valuation_date).map_err(date_err)?;
                let instrument = ResolvedInstrument::IborFixingDeposit(IborFixingDeposit {
                    currency: index.currency(),
                    index: *index,
                    start: valuation_date,
                    end,
                    accrual_factor: day_count.year_fraction_f64(valuation_date, end),
                    rate: quote,
                    notional: 1.0,
                });
                Ok((instrument, end))
            }
            InstrumentTemplate::Fra {
                index,
                start_months,
                day_count,
            } => {
                let tenor = index.tenor().ok_or_else(|| {
                    CalibError::invalid_instrument(&context, "FRA requires a term index")
                })?;
                let start = valuation_date
                    .add_months(*start_months as i32)
                    .map_err(date_err)?;
                let end = tenor.add_to(start).map_err(date_err)?;
                let instrument = ResolvedInstrument::Fra(Fra {
                    currency: index.currency(),
                    index: *index,
                    start,
                    end,
                    accrual_factor: day_count.year_fraction_f64(start, end),
                    rate: quote,
                    notional: 1.0,
                });
                Ok((instrument, end))
            }
            InstrumentTemplate::Swap {
                index,
                tenor,
                fixed_frequency,
                fixed_day_count,
            } => {
                let index_tenor = index.tenor().ok_or_else(|| {
                    CalibError::invalid_instrument(&context, "swap requires a term index")
                })?;
                let end = tenor.add_to(valuation_date).map_err(date_err)?;
                let fixed_periods = fixed_schedule(
                    valuation_date,
                    end,
                    fixed_frequency.months_per_period(),
                    *fixed_day_count,
                )
                .map_err(date_err)?;

                let float_months = match index_tenor {
                    Tenor::Months(m) => m,
                    _ => {
                        return Err(CalibError::invalid_instrument(
                            &context,
                            "term index tenor must be in months",
                        ))
                    }
                };
                let floating_periods = floating_schedule(
                    valuation_date,
                    end,
                    float_months,
                    DayCountConvention::Act360,
                )
                .map_err(date_err)?;

                let instrument = ResolvedInstrument::Swap(Swap {
                    currency: index.currency(),
                    index: *index,
                    fixed_periods,
                    floating_periods,
                    fixed_rate: quote,
                    notional: 1.0,
                });
                Ok((instrument, end))
            }
            InstrumentTemplate::Ois {
                index,
                tenor,
                day_count,
            } => {
                let end = tenor.add_to(valuation_date).map_err(date_err)?;
                let fixed_periods =
                    fixed_schedule(valuation_date, end, 12, *day_count).map_err(date_err)?;
                // Floating compounding periods mirror the fixed schedule
                let floating_periods =
                    floating_schedule(valuation_date, end, 12, *day_count).map_err(date_err)?;

                let instrument = ResolvedInstrument::Swap(Swap {
                    currency: index.currency(),
                    index: *index,
                    fixed_periods,
                    floating_periods,
                    fixed_rate: quote,
                    notional: 1.0,
                });
                Ok((instrument, end))
            }
            InstrumentTemplate::FxSwap { pair, tenor } => {
                let far = tenor.add_to(valuation_date).map_err(date_err)?;
                let instrument = ResolvedInstrument::FxSwap(FxSwap {
                    pair: *pair,
                    near_date: valuation_date,
                    far_date: far,
                    points: quote,
                    notional: 1.0,
                });
                Ok((instrument, far))
            }
            InstrumentTemplate::XccyBasisSwap {
                spread_index,
                flat_index,
                tenor,
                day_count,
            } => {
                let end = tenor.add_to(valuation_date).map_err(date_err)?;
                let spread_periods =
                    floating_schedule(valuation_date, end, 3, *day_count).map_err(date_err)?;
                let flat_periods =
                    floating_schedule(valuation_date, end, 3, *day_count).map_err(date_err)?;

                let instrument = ResolvedInstrument::XccyBasisSwap(XccyBasisSwap {
                    spread_leg: FloatingLeg {
                        currency: spread_index.currency(),
                        index: *spread_index,
                        notional: 1.0,
                        periods: spread_periods,
                    },
                    flat_leg: FloatingLeg {
                        currency: flat_index.currency(),
                        index: *flat_index,
                        notional: 1.0,
                        periods: flat_periods,
                    },
                    start: valuation_date,
                    end,
                    spread: quote,
                });
                Ok((instrument, end))
            }
        }
    }
}

/// Generates a fixed-leg schedule stepping whole months, last period pinned
/// to the end date.
fn fixed_schedule(
    start: Date,
    end: Date,
    step_months: u32,
    day_count: DayCountConvention,
) -> Result<Vec<FixedPeriod>, pillar_core::CoreError> {
    let mut periods = Vec::new();
    let mut prev = start;
    let mut i = 1;
    loop {
        let mut payment = start.add_months((i * step_months) as i32)?;
        let last = payment >= end;
        if last {
            payment = end;
        }
        periods.push(FixedPeriod {
            payment_date: payment,
            accrual_factor: day_count.year_fraction_f64(prev, payment),
        });
        if last {
            break;
        }
        prev = payment;
        i += 1;
    }
    Ok(periods)
}

/// Generates a floating-leg schedule; observation periods coincide with the
/// accrual periods.
fn floating_schedule(
    start: Date,
    end: Date,
    step_months: u32,
    day_count: DayCountConvention,
) -> Result<Vec<FloatingPeriod>, pillar_core::CoreError> {
    let fixed = fixed_schedule(start, end, step_months, day_count)?;
    let mut periods = Vec::with_capacity(fixed.len());
    let mut prev = start;
    for p in fixed {
        periods.push(FloatingPeriod {
            payment_date: p.payment_date,
            accrual_factor: p.accrual_factor,
            start: prev,
            end: p.payment_date,
            index_year_fraction: p.accrual_factor,
        });
        prev = p.payment_date;
    }
    Ok(periods)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valuation_date() -> Date {
        Date::from_ymd(2026, 1, 15).unwrap()
    }

    fn quotes() -> MarketQuotes {
        MarketQuotes::new(valuation_date())
            .with("EUR-DEP-6M", 0.021)
            .with("EUR-IRS-5Y", 0.024)
            .with("EUR-OIS-2Y", 0.020)
    }

    #[test]
    fn test_resolve_deposit() {
        let node = CurveNode::new(
            InstrumentTemplate::Deposit {
                currency: Currency::EUR,
                tenor: Tenor::Months(6),
                day_count: DayCountConvention::Act360,
            },
            "EUR-DEP-6M",
        );

        let (instrument, pillar) = node.resolve(valuation_date(), &quotes()).unwrap();
        assert_eq!(pillar, Date::from_ymd(2026, 7, 15).unwrap());
        assert_eq!(instrument.quote(), 0.021);
        assert_eq!(instrument.kind(), crate::instruments::InstrumentKind::Deposit);
    }

    #[test]
    fn test_resolve_missing_quote() {
        let node = CurveNode::new(
            InstrumentTemplate::Deposit {
                currency: Currency::EUR,
                tenor: Tenor::Months(3),
                day_count: DayCountConvention::Act360,
            },
            "EUR-DEP-3M",
        );

        assert!(matches!(
            node.resolve(valuation_date(), &quotes()),
            Err(CalibError::MissingQuote { .. })
        ));
    }

    #[test]
    fn test_resolve_swap_schedules() {
        let node = CurveNode::new(
            InstrumentTemplate::Swap {
                index: RateIndex::euribor_3m(),
                tenor: Tenor::Years(5),
                fixed_frequency: Frequency::Annual,
                fixed_day_count: DayCountConvention::Thirty360E,
            },
            "EUR-IRS-5Y",
        );

        let (instrument, pillar) = node.resolve(valuation_date(), &quotes()).unwrap();
        assert_eq!(pillar, Date::from_ymd(2031, 1, 15).unwrap());

        match instrument {
            ResolvedInstrument::Swap(swap) => {
                assert_eq!(swap.fixed_periods.len(), 5);
                assert_eq!(swap.floating_periods.len(), 20);
                // Schedules tile the full life of the swap
                assert_eq!(swap.fixed_periods.last().unwrap().payment_date, pillar);
                assert_eq!(swap.floating_periods.last().unwrap().payment_date, pillar);
                // Floating observation periods chain without gaps
                for pair in swap.floating_periods.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                }
            }
            other => panic!("expected swap, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_ois_kind() {
        let node = CurveNode::new(
            InstrumentTemplate::Ois {
                index: RateIndex::eur_overnight(),
                tenor: Tenor::Years(2),
                day_count: DayCountConvention::Act360,
            },
            "EUR-OIS-2Y",
        );

        let (instrument, _) = node.resolve(valuation_date(), &quotes()).unwrap();
        assert_eq!(instrument.kind(), crate::instruments::InstrumentKind::Ois);
    }

    #[test]
    fn test_fixing_requires_term_index() {
        let node = CurveNode::new(
            InstrumentTemplate::IborFixing {
                index: RateIndex::eur_overnight(),
                day_count: DayCountConvention::Act360,
            },
            "EUR-OIS-2Y",
        );
        assert!(matches!(
            node.resolve(valuation_date(), &quotes()),
            Err(CalibError::InvalidInstrument { .. })
        ));
    }
}
