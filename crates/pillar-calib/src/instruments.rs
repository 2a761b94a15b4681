//! Resolved calibration instruments.
//!
//! A [`ResolvedInstrument`] is the "compiled" form the calibrator prices:
//! every date and accrual factor is already final, no calendar or schedule
//! logic remains. The supported products form a closed sum type, so measure
//! dispatch is an exhaustive match rather than a class hierarchy:
//!
//! - [`Deposit`]: cash deposit on the discount curve
//! - [`IborFixingDeposit`]: spot-starting deposit referencing a term index,
//!   anchoring the short end of a forward curve
//! - [`Fra`]: forward rate agreement
//! - [`Swap`]: fixed-for-floating swap; covers both term-index swaps and
//!   OIS depending on the index family
//! - [`FxSwap`]: near/far FX exchange quoted in forward points
//! - [`XccyBasisSwap`]: float-for-float cross-currency swap with a basis
//!   spread and notional exchanges
//!
//! Every instrument exposes the present value, the par measure (rate,
//! forward points, or spread), and *analytic* point sensitivities of both.
//! Forward-rate dependencies are decomposed into the two discount-factor
//! observations that define the forward, so the provider can chain every
//! point through its curve's node weights.

use pillar_core::{Currency, CurrencyPair, Date};
use pillar_curves::{
    CurveKey, PointSensitivities, PointSensitivity, RateIndex, RatesProvider,
};

use crate::error::{CalibError, CalibResult};

/// Classification of instruments for measure selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    /// Cash deposit.
    Deposit,
    /// Index fixing deposit.
    IborFixingDeposit,
    /// Forward rate agreement.
    Fra,
    /// Fixed-for-floating swap on a term index.
    Swap,
    /// Overnight index swap.
    Ois,
    /// FX swap.
    FxSwap,
    /// Cross-currency basis swap.
    XccyBasisSwap,
}

impl std::fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InstrumentKind::Deposit => "Deposit",
            InstrumentKind::IborFixingDeposit => "IborFixingDeposit",
            InstrumentKind::Fra => "FRA",
            InstrumentKind::Swap => "Swap",
            InstrumentKind::Ois => "OIS",
            InstrumentKind::FxSwap => "FxSwap",
            InstrumentKind::XccyBasisSwap => "XccyBasisSwap",
        };
        write!(f, "{s}")
    }
}

/// One fixed-leg accrual period, fully dated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPeriod {
    /// Payment date.
    pub payment_date: Date,
    /// Accrual factor in the leg's day count.
    pub accrual_factor: f64,
}

/// One floating-leg accrual period, fully dated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatingPeriod {
    /// Payment date.
    pub payment_date: Date,
    /// Accrual factor of the payment in the leg's day count.
    pub accrual_factor: f64,
    /// Start of the rate observation period.
    pub start: Date,
    /// End of the rate observation period.
    pub end: Date,
    /// Accrual factor of the observation in the index convention.
    pub index_year_fraction: f64,
}

/// A floating leg: an index, a notional, and its periods.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingLeg {
    /// Leg currency.
    pub currency: Currency,
    /// Projection index.
    pub index: RateIndex,
    /// Leg notional.
    pub notional: f64,
    /// The accrual periods.
    pub periods: Vec<FloatingPeriod>,
}

/// Cash deposit.
///
/// Pays the notional at `start`, receives notional plus interest at `end`.
/// Par rate is the simple rate implied by the two discount factors.
#[derive(Debug, Clone, PartialEq)]
pub struct Deposit {
    /// Deposit currency.
    pub currency: Currency,
    /// Start (settlement) date.
    pub start: Date,
    /// Maturity date.
    pub end: Date,
    /// Accrual factor between start and end.
    pub accrual_factor: f64,
    /// Quoted deposit rate.
    pub rate: f64,
    /// Notional.
    pub notional: f64,
}

/// Spot-starting deposit whose rate references a term index.
///
/// Anchors the short end of the index forward curve: its par measure is the
/// index forward over the deposit period, read off the forward curve.
#[derive(Debug, Clone, PartialEq)]
pub struct IborFixingDeposit {
    /// Deposit currency.
    pub currency: Currency,
    /// The referenced index.
    pub index: RateIndex,
    /// Start date.
    pub start: Date,
    /// End date (start plus the index tenor).
    pub end: Date,
    /// Accrual factor in the index convention.
    pub accrual_factor: f64,
    /// Quoted fixing rate.
    pub rate: f64,
    /// Notional.
    pub notional: f64,
}

/// Forward rate agreement.
#[derive(Debug, Clone, PartialEq)]
pub struct Fra {
    /// FRA currency.
    pub currency: Currency,
    /// The projected index.
    pub index: RateIndex,
    /// Start of the forward period.
    pub start: Date,
    /// End of the forward period.
    pub end: Date,
    /// Accrual factor of the forward period.
    pub accrual_factor: f64,
    /// Quoted FRA rate.
    pub rate: f64,
    /// Notional.
    pub notional: f64,
}

/// Fixed-for-floating interest rate swap.
///
/// The floating leg projects off the index forward curve and both legs
/// discount off the currency discount curve (dual-curve pricing). With an
/// overnight index this is an OIS.
#[derive(Debug, Clone, PartialEq)]
pub struct Swap {
    /// Swap currency.
    pub currency: Currency,
    /// Floating leg projection index.
    pub index: RateIndex,
    /// Fixed leg periods.
    pub fixed_periods: Vec<FixedPeriod>,
    /// Floating leg periods.
    pub floating_periods: Vec<FloatingPeriod>,
    /// Quoted fixed rate.
    pub fixed_rate: f64,
    /// Notional.
    pub notional: f64,
}

/// FX swap quoted in forward points.
///
/// Exchanges notional at the near date at spot and back at the far date at
/// spot plus points. Present value is expressed in the quote currency; the
/// spot rate comes from the provider's FX matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FxSwap {
    /// Currency pair (base notional, quoted in quote currency).
    pub pair: CurrencyPair,
    /// Near exchange date.
    pub near_date: Date,
    /// Far exchange date.
    pub far_date: Date,
    /// Quoted forward points (far rate minus spot).
    pub points: f64,
    /// Notional in the base currency.
    pub notional: f64,
}

/// Cross-currency basis swap.
///
/// Receives the spread leg (foreign float plus basis spread), pays the flat
/// leg (domestic float), with notional exchanges at the start and end of
/// both legs. Present value is expressed in the flat leg currency.
#[derive(Debug, Clone, PartialEq)]
pub struct XccyBasisSwap {
    /// Leg carrying the basis spread (typically the foreign leg).
    pub spread_leg: FloatingLeg,
    /// Flat leg (typically the domestic leg).
    pub flat_leg: FloatingLeg,
    /// Start date (initial notional exchange).
    pub start: Date,
    /// End date (final notional exchange).
    pub end: Date,
    /// Quoted basis spread on the spread leg.
    pub spread: f64,
}

/// The closed set of instruments the calibrator prices.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedInstrument {
    /// Cash deposit.
    Deposit(Deposit),
    /// Index fixing deposit.
    IborFixingDeposit(IborFixingDeposit),
    /// Forward rate agreement.
    Fra(Fra),
    /// Fixed-for-floating swap (term index or OIS).
    Swap(Swap),
    /// FX swap.
    FxSwap(FxSwap),
    /// Cross-currency basis swap.
    XccyBasisSwap(XccyBasisSwap),
}

/// Discount factor at a date on an arbitrary provider curve.
fn df_on(provider: &RatesProvider, key: &CurveKey, date: Date) -> CalibResult<f64> {
    let curve = provider.curve(key)?;
    let t = curve
        .day_count()
        .year_fraction_f64(provider.valuation_date(), date);
    Ok(curve.discount_factor(t)?)
}

/// Simple forward rate over [start, end] on the index forward curve.
fn forward_on(
    provider: &RatesProvider,
    index: RateIndex,
    start: Date,
    end: Date,
    tau: f64,
) -> CalibResult<f64> {
    let key = CurveKey::Forward(index);
    let df_start = df_on(provider, &key, start)?;
    let df_end = df_on(provider, &key, end)?;
    Ok((df_start / df_end - 1.0) / tau)
}

/// Pushes the decomposition of `coeff * d(forward)/d(df)` onto `points`.
fn push_forward_points(
    points: &mut PointSensitivities,
    provider: &RatesProvider,
    index: RateIndex,
    start: Date,
    end: Date,
    tau: f64,
    coeff: f64,
    currency: Currency,
) -> CalibResult<()> {
    let key = CurveKey::Forward(index);
    let df_start = df_on(provider, &key, start)?;
    let df_end = df_on(provider, &key, end)?;

    points.push(PointSensitivity {
        key,
        date: start,
        currency,
        value: coeff / (tau * df_end),
    });
    points.push(PointSensitivity {
        key,
        date: end,
        currency,
        value: -coeff * df_start / (tau * df_end * df_end),
    });
    Ok(())
}

/// Value of a floating leg including notional exchanges, in leg currency:
/// `N * (-df(start) + sum((fwd_j + spread) * tau_j * df(pay_j)) + df(end))`.
fn floating_leg_value(
    provider: &RatesProvider,
    leg: &FloatingLeg,
    spread: f64,
    start: Date,
    end: Date,
) -> CalibResult<f64> {
    let dsc = CurveKey::Discount(leg.currency);
    let mut value = -df_on(provider, &dsc, start)? + df_on(provider, &dsc, end)?;
    for p in &leg.periods {
        let fwd = forward_on(provider, leg.index, p.start, p.end, p.index_year_fraction)?;
        value += (fwd + spread) * p.accrual_factor * df_on(provider, &dsc, p.payment_date)?;
    }
    Ok(leg.notional * value)
}

/// Point sensitivities of [`floating_leg_value`], scaled by `coeff`.
fn floating_leg_value_points(
    points: &mut PointSensitivities,
    provider: &RatesProvider,
    leg: &FloatingLeg,
    spread: f64,
    start: Date,
    end: Date,
    coeff: f64,
    report_ccy: Currency,
) -> CalibResult<()> {
    let dsc = CurveKey::Discount(leg.currency);
    let n = leg.notional * coeff;

    points.push(PointSensitivity {
        key: dsc,
        date: start,
        currency: report_ccy,
        value: -n,
    });
    points.push(PointSensitivity {
        key: dsc,
        date: end,
        currency: report_ccy,
        value: n,
    });

    for p in &leg.periods {
        let fwd = forward_on(provider, leg.index, p.start, p.end, p.index_year_fraction)?;
        let df_pay = df_on(provider, &dsc, p.payment_date)?;

        points.push(PointSensitivity {
            key: dsc,
            date: p.payment_date,
            currency: report_ccy,
            value: n * (fwd + spread) * p.accrual_factor,
        });
        push_forward_points(
            points,
            provider,
            leg.index,
            p.start,
            p.end,
            p.index_year_fraction,
            n * p.accrual_factor * df_pay,
            report_ccy,
        )?;
    }
    Ok(())
}

/// Annuity of the spread on a floating leg: `N * sum(tau_j * df(pay_j))`.
fn floating_leg_spread_annuity(provider: &RatesProvider, leg: &FloatingLeg) -> CalibResult<f64> {
    let dsc = CurveKey::Discount(leg.currency);
    let mut annuity = 0.0;
    for p in &leg.periods {
        annuity += p.accrual_factor * df_on(provider, &dsc, p.payment_date)?;
    }
    Ok(leg.notional * annuity)
}

/// Point sensitivities of [`floating_leg_spread_annuity`], scaled by `coeff`.
fn floating_leg_spread_annuity_points(
    points: &mut PointSensitivities,
    leg: &FloatingLeg,
    coeff: f64,
    report_ccy: Currency,
) {
    let dsc = CurveKey::Discount(leg.currency);
    for p in &leg.periods {
        points.push(PointSensitivity {
            key: dsc,
            date: p.payment_date,
            currency: report_ccy,
            value: leg.notional * coeff * p.accrual_factor,
        });
    }
}

impl Swap {
    /// Fixed-leg annuity: `sum(tau_i * df(pay_i))` (unit notional).
    fn annuity(&self, provider: &RatesProvider) -> CalibResult<f64> {
        let dsc = CurveKey::Discount(self.currency);
        let mut annuity = 0.0;
        for p in &self.fixed_periods {
            annuity += p.accrual_factor * df_on(provider, &dsc, p.payment_date)?;
        }
        Ok(annuity)
    }

    /// Floating-leg value `sum(fwd_j * tau_j * df(pay_j))` (unit notional).
    fn floating_value(&self, provider: &RatesProvider) -> CalibResult<f64> {
        let dsc = CurveKey::Discount(self.currency);
        let mut value = 0.0;
        for p in &self.floating_periods {
            let fwd = forward_on(provider, self.index, p.start, p.end, p.index_year_fraction)?;
            value += fwd * p.accrual_factor * df_on(provider, &dsc, p.payment_date)?;
        }
        Ok(value)
    }

    /// Points of the annuity, scaled by `coeff`.
    fn annuity_points(&self, points: &mut PointSensitivities, coeff: f64) {
        let dsc = CurveKey::Discount(self.currency);
        for p in &self.fixed_periods {
            points.push(PointSensitivity {
                key: dsc,
                date: p.payment_date,
                currency: self.currency,
                value: coeff * p.accrual_factor,
            });
        }
    }

    /// Points of the floating value, scaled by `coeff`.
    fn floating_value_points(
        &self,
        points: &mut PointSensitivities,
        provider: &RatesProvider,
        coeff: f64,
    ) -> CalibResult<()> {
        let dsc = CurveKey::Discount(self.currency);
        for p in &self.floating_periods {
            let fwd = forward_on(provider, self.index, p.start, p.end, p.index_year_fraction)?;
            let df_pay = df_on(provider, &dsc, p.payment_date)?;

            points.push(PointSensitivity {
                key: dsc,
                date: p.payment_date,
                currency: self.currency,
                value: coeff * fwd * p.accrual_factor,
            });
            push_forward_points(
                points,
                provider,
                self.index,
                p.start,
                p.end,
                p.index_year_fraction,
                coeff * p.accrual_factor * df_pay,
                self.currency,
            )?;
        }
        Ok(())
    }

    fn check_annuity(&self, annuity: f64) -> CalibResult<()> {
        if annuity.abs() < 1e-12 {
            return Err(CalibError::invalid_instrument(
                "swap",
                "fixed leg annuity is zero",
            ));
        }
        Ok(())
    }
}

impl ResolvedInstrument {
    /// Returns the instrument kind for measure selection.
    #[must_use]
    pub fn kind(&self) -> InstrumentKind {
        match self {
            ResolvedInstrument::Deposit(_) => InstrumentKind::Deposit,
            ResolvedInstrument::IborFixingDeposit(_) => InstrumentKind::IborFixingDeposit,
            ResolvedInstrument::Fra(_) => InstrumentKind::Fra,
            ResolvedInstrument::Swap(swap) => match swap.index {
                RateIndex::Overnight { .. } => InstrumentKind::Ois,
                RateIndex::Ibor { .. } => InstrumentKind::Swap,
            },
            ResolvedInstrument::FxSwap(_) => InstrumentKind::FxSwap,
            ResolvedInstrument::XccyBasisSwap(_) => InstrumentKind::XccyBasisSwap,
        }
    }

    /// Currency the present value is expressed in.
    #[must_use]
    pub fn currency(&self) -> Currency {
        match self {
            ResolvedInstrument::Deposit(d) => d.currency,
            ResolvedInstrument::IborFixingDeposit(d) => d.currency,
            ResolvedInstrument::Fra(f) => f.currency,
            ResolvedInstrument::Swap(s) => s.currency,
            ResolvedInstrument::FxSwap(f) => f.pair.quote,
            ResolvedInstrument::XccyBasisSwap(x) => x.flat_leg.currency,
        }
    }

    /// The quoted value the instrument was resolved with (rate, points, or
    /// spread, matching the par measure's units).
    #[must_use]
    pub fn quote(&self) -> f64 {
        match self {
            ResolvedInstrument::Deposit(d) => d.rate,
            ResolvedInstrument::IborFixingDeposit(d) => d.rate,
            ResolvedInstrument::Fra(f) => f.rate,
            ResolvedInstrument::Swap(s) => s.fixed_rate,
            ResolvedInstrument::FxSwap(f) => f.points,
            ResolvedInstrument::XccyBasisSwap(x) => x.spread,
        }
    }

    /// Notional of the instrument, used for PV tolerance scaling.
    #[must_use]
    pub fn notional(&self) -> f64 {
        match self {
            ResolvedInstrument::Deposit(d) => d.notional,
            ResolvedInstrument::IborFixingDeposit(d) => d.notional,
            ResolvedInstrument::Fra(f) => f.notional,
            ResolvedInstrument::Swap(s) => s.notional,
            ResolvedInstrument::FxSwap(f) => f.notional,
            ResolvedInstrument::XccyBasisSwap(x) => x.flat_leg.notional.abs(),
        }
    }

    /// Present value against the provider, in [`Self::currency`] units.
    ///
    /// # Errors
    ///
    /// Propagates missing-curve and curve evaluation errors.
    pub fn present_value(&self, provider: &RatesProvider) -> CalibResult<f64> {
        match self {
            ResolvedInstrument::Deposit(d) => {
                let dsc = CurveKey::Discount(d.currency);
                let df_start = df_on(provider, &dsc, d.start)?;
                let df_end = df_on(provider, &dsc, d.end)?;
                Ok(d.notional * (-df_start + (1.0 + d.rate * d.accrual_factor) * df_end))
            }
            ResolvedInstrument::IborFixingDeposit(d) => {
                let fwd = forward_on(provider, d.index, d.start, d.end, d.accrual_factor)?;
                let df_end = df_on(provider, &CurveKey::Discount(d.currency), d.end)?;
                Ok(d.notional * (fwd - d.rate) * d.accrual_factor * df_end)
            }
            ResolvedInstrument::Fra(f) => {
                let fwd = forward_on(provider, f.index, f.start, f.end, f.accrual_factor)?;
                let df_end = df_on(provider, &CurveKey::Discount(f.currency), f.end)?;
                Ok(f.notional * (fwd - f.rate) * f.accrual_factor * df_end)
            }
            ResolvedInstrument::Swap(s) => {
                // Receiver of fixed: PV = N * (K * annuity - floating value)
                let annuity = s.annuity(provider)?;
                let floating = s.floating_value(provider)?;
                Ok(s.notional * (s.fixed_rate * annuity - floating))
            }
            ResolvedInstrument::FxSwap(f) => {
                let spot = provider.fx_rate(f.pair.base, f.pair.quote)?;
                let dsc_base = CurveKey::Discount(f.pair.base);
                let dsc_quote = CurveKey::Discount(f.pair.quote);
                let df_b_near = df_on(provider, &dsc_base, f.near_date)?;
                let df_b_far = df_on(provider, &dsc_base, f.far_date)?;
                let df_q_near = df_on(provider, &dsc_quote, f.near_date)?;
                let df_q_far = df_on(provider, &dsc_quote, f.far_date)?;

                // Base flows valued at spot, quote flows directly
                Ok(f.notional
                    * (spot * (df_b_far - df_b_near) + spot * df_q_near
                        - (spot + f.points) * df_q_far))
            }
            ResolvedInstrument::XccyBasisSwap(x) => {
                let spot = provider.fx_rate(x.spread_leg.currency, x.flat_leg.currency)?;
                let spread_value =
                    floating_leg_value(provider, &x.spread_leg, x.spread, x.start, x.end)?;
                let flat_value = floating_leg_value(provider, &x.flat_leg, 0.0, x.start, x.end)?;
                Ok(spot * spread_value - flat_value)
            }
        }
    }

    /// Par measure: the rate, forward points, or spread that the current
    /// curves imply for this instrument.
    ///
    /// # Errors
    ///
    /// Propagates missing-curve and curve evaluation errors; a zero fixed
    /// annuity is an invalid-instrument error.
    pub fn par_measure(&self, provider: &RatesProvider) -> CalibResult<f64> {
        match self {
            ResolvedInstrument::Deposit(d) => {
                let dsc = CurveKey::Discount(d.currency);
                let df_start = df_on(provider, &dsc, d.start)?;
                let df_end = df_on(provider, &dsc, d.end)?;
                Ok((df_start / df_end - 1.0) / d.accrual_factor)
            }
            ResolvedInstrument::IborFixingDeposit(d) => {
                forward_on(provider, d.index, d.start, d.end, d.accrual_factor)
            }
            ResolvedInstrument::Fra(f) => {
                forward_on(provider, f.index, f.start, f.end, f.accrual_factor)
            }
            ResolvedInstrument::Swap(s) => {
                let annuity = s.annuity(provider)?;
                s.check_annuity(annuity)?;
                let floating = s.floating_value(provider)?;
                Ok(floating / annuity)
            }
            ResolvedInstrument::FxSwap(f) => {
                let spot = provider.fx_rate(f.pair.base, f.pair.quote)?;
                let dsc_base = CurveKey::Discount(f.pair.base);
                let dsc_quote = CurveKey::Discount(f.pair.quote);
                let df_b_near = df_on(provider, &dsc_base, f.near_date)?;
                let df_b_far = df_on(provider, &dsc_base, f.far_date)?;
                let df_q_near = df_on(provider, &dsc_quote, f.near_date)?;
                let df_q_far = df_on(provider, &dsc_quote, f.far_date)?;

                // Far rate that zeroes the PV, minus spot
                let far = (spot * (df_b_far - df_b_near) + spot * df_q_near) / df_q_far;
                Ok(far - spot)
            }
            ResolvedInstrument::XccyBasisSwap(x) => {
                let spot = provider.fx_rate(x.spread_leg.currency, x.flat_leg.currency)?;
                let flat_value = floating_leg_value(provider, &x.flat_leg, 0.0, x.start, x.end)?;
                let spread_value0 =
                    floating_leg_value(provider, &x.spread_leg, 0.0, x.start, x.end)?;
                let annuity = floating_leg_spread_annuity(provider, &x.spread_leg)?;
                if (spot * annuity).abs() < 1e-12 {
                    return Err(CalibError::invalid_instrument(
                        "xccy basis swap",
                        "spread leg annuity is zero",
                    ));
                }
                Ok((flat_value - spot * spread_value0) / (spot * annuity))
            }
        }
    }

    /// Analytic point sensitivity of [`Self::present_value`].
    ///
    /// # Errors
    ///
    /// Propagates missing-curve and curve evaluation errors.
    pub fn present_value_sensitivity(
        &self,
        provider: &RatesProvider,
    ) -> CalibResult<PointSensitivities> {
        let mut points = PointSensitivities::none();
        match self {
            ResolvedInstrument::Deposit(d) => {
                let dsc = CurveKey::Discount(d.currency);
                points.push(PointSensitivity {
                    key: dsc,
                    date: d.start,
                    currency: d.currency,
                    value: -d.notional,
                });
                points.push(PointSensitivity {
                    key: dsc,
                    date: d.end,
                    currency: d.currency,
                    value: d.notional * (1.0 + d.rate * d.accrual_factor),
                });
            }
            ResolvedInstrument::IborFixingDeposit(d) => {
                let dsc = CurveKey::Discount(d.currency);
                let fwd = forward_on(provider, d.index, d.start, d.end, d.accrual_factor)?;
                let df_end = df_on(provider, &dsc, d.end)?;

                push_forward_points(
                    &mut points,
                    provider,
                    d.index,
                    d.start,
                    d.end,
                    d.accrual_factor,
                    d.notional * d.accrual_factor * df_end,
                    d.currency,
                )?;
                points.push(PointSensitivity {
                    key: dsc,
                    date: d.end,
                    currency: d.currency,
                    value: d.notional * (fwd - d.rate) * d.accrual_factor,
                });
            }
            ResolvedInstrument::Fra(f) => {
                let dsc = CurveKey::Discount(f.currency);
                let fwd = forward_on(provider, f.index, f.start, f.end, f.accrual_factor)?;
                let df_end = df_on(provider, &dsc, f.end)?;

                push_forward_points(
                    &mut points,
                    provider,
                    f.index,
                    f.start,
                    f.end,
                    f.accrual_factor,
                    f.notional * f.accrual_factor * df_end,
                    f.currency,
                )?;
                points.push(PointSensitivity {
                    key: dsc,
                    date: f.end,
                    currency: f.currency,
                    value: f.notional * (fwd - f.rate) * f.accrual_factor,
                });
            }
            ResolvedInstrument::Swap(s) => {
                // d PV = N * (K * dA - dF)
                s.annuity_points(&mut points, s.notional * s.fixed_rate);
                s.floating_value_points(&mut points, provider, -s.notional)?;
            }
            ResolvedInstrument::FxSwap(f) => {
                let spot = provider.fx_rate(f.pair.base, f.pair.quote)?;
                let dsc_base = CurveKey::Discount(f.pair.base);
                let dsc_quote = CurveKey::Discount(f.pair.quote);

                points.push(PointSensitivity {
                    key: dsc_base,
                    date: f.near_date,
                    currency: f.pair.quote,
                    value: -f.notional * spot,
                });
                points.push(PointSensitivity {
                    key: dsc_base,
                    date: f.far_date,
                    currency: f.pair.quote,
                    value: f.notional * spot,
                });
                points.push(PointSensitivity {
                    key: dsc_quote,
                    date: f.near_date,
                    currency: f.pair.quote,
                    value: f.notional * spot,
                });
                points.push(PointSensitivity {
                    key: dsc_quote,
                    date: f.far_date,
                    currency: f.pair.quote,
                    value: -f.notional * (spot + f.points),
                });
            }
            ResolvedInstrument::XccyBasisSwap(x) => {
                let spot = provider.fx_rate(x.spread_leg.currency, x.flat_leg.currency)?;
                let ccy = x.flat_leg.currency;
                floating_leg_value_points(
                    &mut points,
                    provider,
                    &x.spread_leg,
                    x.spread,
                    x.start,
                    x.end,
                    spot,
                    ccy,
                )?;
                floating_leg_value_points(
                    &mut points, provider, &x.flat_leg, 0.0, x.start, x.end, -1.0, ccy,
                )?;
            }
        }
        Ok(points)
    }

    /// Analytic point sensitivity of [`Self::par_measure`].
    ///
    /// # Errors
    ///
    /// Propagates missing-curve and curve evaluation errors.
    pub fn par_measure_sensitivity(
        &self,
        provider: &RatesProvider,
    ) -> CalibResult<PointSensitivities> {
        let mut points = PointSensitivities::none();
        match self {
            ResolvedInstrument::Deposit(d) => {
                let dsc = CurveKey::Discount(d.currency);
                let df_start = df_on(provider, &dsc, d.start)?;
                let df_end = df_on(provider, &dsc, d.end)?;

                points.push(PointSensitivity {
                    key: dsc,
                    date: d.start,
                    currency: d.currency,
                    value: 1.0 / (d.accrual_factor * df_end),
                });
                points.push(PointSensitivity {
                    key: dsc,
                    date: d.end,
                    currency: d.currency,
                    value: -df_start / (d.accrual_factor * df_end * df_end),
                });
            }
            ResolvedInstrument::IborFixingDeposit(d) => {
                push_forward_points(
                    &mut points,
                    provider,
                    d.index,
                    d.start,
                    d.end,
                    d.accrual_factor,
                    1.0,
                    d.currency,
                )?;
            }
            ResolvedInstrument::Fra(f) => {
                push_forward_points(
                    &mut points,
                    provider,
                    f.index,
                    f.start,
                    f.end,
                    f.accrual_factor,
                    1.0,
                    f.currency,
                )?;
            }
            ResolvedInstrument::Swap(s) => {
                // par = F / A; d par = dF / A - (F / A^2) dA
                let annuity = s.annuity(provider)?;
                s.check_annuity(annuity)?;
                let floating = s.floating_value(provider)?;

                s.floating_value_points(&mut points, provider, 1.0 / annuity)?;
                s.annuity_points(&mut points, -floating / (annuity * annuity));
            }
            ResolvedInstrument::FxSwap(f) => {
                let spot = provider.fx_rate(f.pair.base, f.pair.quote)?;
                let dsc_base = CurveKey::Discount(f.pair.base);
                let dsc_quote = CurveKey::Discount(f.pair.quote);
                let df_b_near = df_on(provider, &dsc_base, f.near_date)?;
                let df_b_far = df_on(provider, &dsc_base, f.far_date)?;
                let df_q_near = df_on(provider, &dsc_quote, f.near_date)?;
                let df_q_far = df_on(provider, &dsc_quote, f.far_date)?;
                let far = (spot * (df_b_far - df_b_near) + spot * df_q_near) / df_q_far;

                points.push(PointSensitivity {
                    key: dsc_base,
                    date: f.near_date,
                    currency: f.pair.quote,
                    value: -spot / df_q_far,
                });
                points.push(PointSensitivity {
                    key: dsc_base,
                    date: f.far_date,
                    currency: f.pair.quote,
                    value: spot / df_q_far,
                });
                points.push(PointSensitivity {
                    key: dsc_quote,
                    date: f.near_date,
                    currency: f.pair.quote,
                    value: spot / df_q_far,
                });
                points.push(PointSensitivity {
                    key: dsc_quote,
                    date: f.far_date,
                    currency: f.pair.quote,
                    value: -far / df_q_far,
                });
            }
            ResolvedInstrument::XccyBasisSwap(x) => {
                // s* = (V_flat - spot * V_spread0) / (spot * A)
                // d s* = dV_flat/(spot A) - dV_spread0/A - s* * dA/A
                let spot = provider.fx_rate(x.spread_leg.currency, x.flat_leg.currency)?;
                let ccy = x.flat_leg.currency;
                let annuity = floating_leg_spread_annuity(provider, &x.spread_leg)?;
                if (spot * annuity).abs() < 1e-12 {
                    return Err(CalibError::invalid_instrument(
                        "xccy basis swap",
                        "spread leg annuity is zero",
                    ));
                }
                let par = self.par_measure(provider)?;

                floating_leg_value_points(
                    &mut points,
                    provider,
                    &x.flat_leg,
                    0.0,
                    x.start,
                    x.end,
                    1.0 / (spot * annuity),
                    ccy,
                )?;
                floating_leg_value_points(
                    &mut points,
                    provider,
                    &x.spread_leg,
                    0.0,
                    x.start,
                    x.end,
                    -1.0 / annuity,
                    ccy,
                )?;
                floating_leg_spread_annuity_points(&mut points, &x.spread_leg, -par / annuity, ccy);
            }
        }
        Ok(points)
    }
}
