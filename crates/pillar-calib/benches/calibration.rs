//! Calibration benchmark: the two-curve EUR group.

use criterion::{criterion_group, criterion_main, Criterion};
use pillar_calib::prelude::*;
use pillar_core::daycounts::DayCountConvention;
use pillar_core::{Currency, Date, Frequency, Tenor};
use pillar_curves::{CurveMeta, FxMatrix, RateIndex};

fn eur_setup() -> (CalibrationDefinition, MarketQuotes) {
    let valuation_date = Date::from_ymd(2026, 6, 30).unwrap();

    let ois = |tenor: u32, id: &str| {
        CurveNode::new(
            InstrumentTemplate::Ois {
                index: RateIndex::eur_overnight(),
                tenor: Tenor::Years(tenor),
                day_count: DayCountConvention::Act360,
            },
            id,
        )
    };
    let irs = |tenor: u32, id: &str| {
        CurveNode::new(
            InstrumentTemplate::Swap {
                index: RateIndex::euribor_3m(),
                tenor: Tenor::Years(tenor),
                fixed_frequency: Frequency::Annual,
                fixed_day_count: DayCountConvention::Thirty360E,
            },
            id,
        )
    };

    let discount = CurveGroupEntry::new(CurveDefinition::new(
        "EUR-DSC",
        vec![
            ois(1, "OIS-1Y"),
            ois(2, "OIS-2Y"),
            ois(5, "OIS-5Y"),
            ois(10, "OIS-10Y"),
            ois(30, "OIS-30Y"),
        ],
        CurveMeta::default(),
    ))
    .discounting(Currency::EUR)
    .forwarding(RateIndex::eur_overnight());

    let projection = CurveGroupEntry::new(CurveDefinition::new(
        "EUR-EURIBOR3M",
        vec![
            irs(1, "IRS-1Y"),
            irs(2, "IRS-2Y"),
            irs(5, "IRS-5Y"),
            irs(10, "IRS-10Y"),
            irs(30, "IRS-30Y"),
        ],
        CurveMeta::default(),
    ))
    .forwarding(RateIndex::euribor_3m());

    let definition = CalibrationDefinition::sequential(vec![CurveGroupDefinition::new(
        "eur",
        vec![discount, projection],
    )]);

    let quotes = MarketQuotes::new(valuation_date)
        .with("OIS-1Y", 0.0008)
        .with("OIS-2Y", 0.0010)
        .with("OIS-5Y", 0.0020)
        .with("OIS-10Y", 0.0030)
        .with("OIS-30Y", 0.0040)
        .with("IRS-1Y", 0.0040)
        .with("IRS-2Y", 0.0045)
        .with("IRS-5Y", 0.0055)
        .with("IRS-10Y", 0.0065)
        .with("IRS-30Y", 0.0070);

    (definition, quotes)
}

fn bench_calibration(c: &mut Criterion) {
    let (definition, quotes) = eur_setup();
    let calibrator = CurveCalibrator::new();

    c.bench_function("calibrate_eur_two_curves", |b| {
        b.iter(|| {
            calibrator
                .calibrate(&definition, &quotes, FxMatrix::new())
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_calibration);
criterion_main!(benches);
