//! Tests for the dimension-checked quantity types

#[cfg(test)]
mod measure_tests {
    use crate::units::*;

    #[test]
    fn test_bad_dimensionality_in_price() {
        let err = CurrencyPerTime::parse("20 usd").unwrap_err();
        assert!(err.is_dimensionality_mismatch(), "got {:?}", err);
    }

    #[test]
    fn test_bad_dimensionality_in_cores() {
        let err = ComputationalUnits::parse("2 liter").unwrap_err();
        assert!(err.is_dimensionality_mismatch(), "got {:?}", err);
    }

    #[test]
    fn test_bad_dimensionality_in_memory() {
        let err = Storage::parse("2 cm").unwrap_err();
        assert!(err.is_dimensionality_mismatch(), "got {:?}", err);
    }

    #[test]
    fn test_bad_dimensionality_in_performance() {
        let err = RequestsPerTime::parse("20 req / cm").unwrap_err();
        assert!(err.is_dimensionality_mismatch(), "got {:?}", err);
    }

    #[test]
    fn test_bad_currency() {
        let err = CurrencyPerTime::parse("20 eur/hour").unwrap_err();
        assert_eq!(
            err,
            UnitError::UnrecognizedUnit {
                symbol: "eur".to_string()
            }
        );
    }

    #[test]
    fn test_mismatch_reports_dimensions() {
        match Time::parse("3 usd") {
            Err(UnitError::DimensionalityMismatch {
                value,
                expected,
                found,
            }) => {
                assert_eq!(value, "3 usd");
                assert_eq!(expected, Dimension::TIME);
                assert_eq!(found, Dimension::CURRENCY);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    /// Every kind rejects units of every other kind
    #[test]
    fn test_dimension_enforcement_grid() {
        let samples = [
            "1 hour",
            "1 usd",
            "1 usd/hour",
            "1 core",
            "1 GiB",
            "1 req",
            "1 req/s",
        ];
        let checks: [(&str, fn(&str) -> UnitResult<()>); 7] = [
            ("1 hour", |s| Time::parse(s).map(|_| ())),
            ("1 usd", |s| Currency::parse(s).map(|_| ())),
            ("1 usd/hour", |s| CurrencyPerTime::parse(s).map(|_| ())),
            ("1 core", |s| ComputationalUnits::parse(s).map(|_| ())),
            ("1 GiB", |s| Storage::parse(s).map(|_| ())),
            ("1 req", |s| Requests::parse(s).map(|_| ())),
            ("1 req/s", |s| RequestsPerTime::parse(s).map(|_| ())),
        ];

        for (accepted, check) in checks {
            for sample in samples {
                let result = check(sample);
                if sample == accepted {
                    assert!(result.is_ok(), "{} should be accepted", sample);
                } else {
                    assert!(
                        result.unwrap_err().is_dimensionality_mismatch(),
                        "{} should be rejected for {}",
                        sample,
                        accepted
                    );
                }
            }
            assert!(check("1 furlong").unwrap_err().is_unrecognized_unit());
        }
    }

    #[test]
    fn test_time_conversion() {
        let t = Time::parse("1h").unwrap().to("minute").unwrap();
        assert_eq!(t.magnitude(), 60.0);
    }

    #[test]
    fn test_different_conversions() {
        let reqs = RequestsPerTime::parse("1 req/s").unwrap().to("req/min").unwrap();
        assert_eq!(reqs.magnitude(), 60.0);

        let reqs = RequestsPerTime::parse("1 req/second")
            .unwrap()
            .to("req/minute")
            .unwrap();
        assert_eq!(reqs.magnitude(), 60.0);

        let price = CurrencyPerTime::parse("1 usd/min").unwrap().to("usd/h").unwrap();
        assert_eq!(price.magnitude(), 60.0);

        let cores = ComputationalUnits::parse("1 cores").unwrap().to("millicores").unwrap();
        assert_eq!(cores.magnitude(), 1000.0);

        let mem = Storage::parse("1 GiB").unwrap().to("MiB").unwrap();
        assert_eq!(mem.magnitude(), 1024.0);
    }

    #[test]
    fn test_named_rate_units() {
        let rpm = RequestsPerTime::parse("120 rpm").unwrap();
        assert_eq!(rpm.to("rps").unwrap().magnitude(), 2.0);
        assert_eq!(rpm.to("req / hour").unwrap().magnitude(), 7200.0);
    }

    #[test]
    fn test_conversion_to_other_dimension_fails() {
        let err = Time::parse("1 hour").unwrap().to("usd").unwrap_err();
        assert!(err.is_dimensionality_mismatch());

        let err = CurrencyPerTime::parse("1 usd/hour").unwrap().to("usd").unwrap_err();
        assert!(err.is_dimensionality_mismatch());
    }

    /// Every pair of `units` gives the same result through an intermediate
    /// unit as directly
    fn assert_round_trips<K: Kind>(value: &str, units: &[&str]) {
        let original = Measure::<K>::parse(value).unwrap();
        for u1 in units {
            for u2 in units {
                let via = original.to(u1).unwrap().to(u2).unwrap();
                let direct = original.to(u2).unwrap();
                assert!(
                    via.approx_eq(&direct, DEFAULT_REL_TOLERANCE),
                    "{} -> {} -> {}: {} vs {}",
                    original,
                    u1,
                    u2,
                    via,
                    direct
                );
                assert!(direct.approx_eq(&original, DEFAULT_REL_TOLERANCE));
            }
        }
    }

    /// Converting into the value's own unit changes nothing
    fn assert_identity<K: Kind>(values: &[&str]) {
        for raw in values {
            let value = Measure::<K>::parse(raw).unwrap();
            let same = value.to_unit(value.unit()).unwrap();
            assert!(same.approx_eq(&value, DEFAULT_REL_TOLERANCE), "{}", raw);
            assert_eq!(same.unit(), value.unit());
        }
    }

    #[test]
    fn test_conversion_round_trip() {
        assert_round_trips::<TimeKind>(
            "37.5 minute",
            &["hour", "minute", "second", "ms", "day", "year"],
        );
        assert_round_trips::<CurrencyKind>("12.5 usd", &["usd"]);
        assert_round_trips::<CurrencyRateKind>(
            "0.096 usd/hour",
            &["usd/hour", "usd/min", "usd/s", "usd/day"],
        );
        assert_round_trips::<ComputationKind>("2.5 cores", &["core", "millicore", "vcore"]);
        assert_round_trips::<StorageKind>(
            "1.5 GiB",
            &["byte", "bit", "kB", "MB", "KiB", "MiB", "GiB", "TiB"],
        );
        assert_round_trips::<RequestsKind>("250 req", &["req", "requests"]);
        assert_round_trips::<RequestRateKind>(
            "10 req/s",
            &["req/s", "rps", "rpm", "rph", "req/hour", "req / minute"],
        );
    }

    #[test]
    fn test_conversion_identity() {
        assert_identity::<TimeKind>(&["15 min", "0.25 hour", "10 ms"]);
        assert_identity::<CurrencyKind>(&["0 usd", "3.2 usd"]);
        assert_identity::<CurrencyRateKind>(&["0.5 usd/hour", "3 usd/min", "1e-3 usd/s"]);
        assert_identity::<ComputationKind>(&["2 cores", "500 millicores", "4 vcores"]);
        assert_identity::<StorageKind>(&["8 GiB", "512 MiB", "1 byte"]);
        assert_identity::<RequestsKind>(&["100 req"]);
        assert_identity::<RequestRateKind>(&["10 req/s", "120 rpm", "5 rph"]);
    }

    #[test]
    fn test_new_from_magnitude_and_unit() {
        let mem = Storage::new(4.0, "GiB").unwrap();
        assert_eq!(mem.to_string(), "4 gibibyte");
        assert!(Storage::new(4.0, "GiB/s").unwrap_err().is_dimensionality_mismatch());
    }

    #[test]
    fn test_try_from_quantity() {
        let q = Quantity::parse("15 min").unwrap();
        let t = Time::try_from(q.clone()).unwrap();
        assert_eq!(t.quantity(), &q);
        assert!(Currency::try_from(q).is_err());
    }

    #[test]
    fn test_typed_products() {
        let price = CurrencyPerTime::parse("0.5 usd/hour").unwrap();
        let cost = price.cost_over(&Time::parse("30 minute").unwrap()).unwrap();
        assert!((cost.to("usd").unwrap().magnitude() - 0.25).abs() < 1e-12);

        let rate = RequestsPerTime::parse("2 req/s").unwrap();
        let served = rate.requests_over(&Time::parse("1 minute").unwrap()).unwrap();
        assert_eq!(served.to("req").unwrap().magnitude(), 120.0);
    }

    #[test]
    fn test_typed_products_report_exponent_overflow() {
        let price = CurrencyPerTime::parse("1 usd * s^100 / min^101").unwrap();
        let span = Time::parse("1 s^100 / min^99").unwrap();
        let err = price.cost_over(&span).unwrap_err();
        assert!(matches!(err, UnitError::MalformedQuantity { .. }), "got {:?}", err);
    }

    #[test]
    fn test_exponent_out_of_range() {
        let err = ComputationalUnits::parse("2 liter^50").unwrap_err();
        assert!(matches!(err, UnitError::MalformedQuantity { .. }), "got {:?}", err);
        assert!(Time::parse("1 s^100 * s^100").is_err());
        assert!(Time::parse("1 s^-128").is_err());
    }

    #[test]
    fn test_display_and_debug() {
        let price = CurrencyPerTime::parse("0.5 usd/h").unwrap();
        assert_eq!(price.to_string(), "0.5 usd / hour");
        assert_eq!(format!("{:?}", price), "CurrencyPerTime(\"0.5 usd / hour\")");

        let cores = ComputationalUnits::parse("1000 millicores").unwrap();
        assert_eq!(cores.to_string(), "1000 millicore");
    }

    #[test]
    fn test_serde_as_string() {
        let price = CurrencyPerTime::parse("0.5 usd/h").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"0.5 usd / hour\"");

        let back: CurrencyPerTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);

        let bad: Result<CurrencyPerTime, _> = serde_json::from_str("\"20 eur/hour\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_custom_registry() {
        let registry = UnitRegistry::builder()
            .define(UnitDef::new("second", Dimension::TIME), &["s"])
            .define(UnitDef::new("hour", Dimension::TIME).with_scale(3600.0, 1.0), &["h"])
            .define(UnitDef::new("eur", Dimension::CURRENCY), &[])
            .build()
            .unwrap();
        let price = Quantity::parse_in(&registry, "20 eur/s").unwrap();
        assert_eq!(price.dimension(), Dimension::CURRENCY_RATE);
        assert_eq!(price.to_in(&registry, "eur/h").unwrap().magnitude(), 72000.0);
        assert!(CurrencyPerTime::parse_in(&registry, "20 eur/s").is_ok());
        assert!(CurrencyPerTime::parse("20 eur/s").is_err());
    }

    #[test]
    fn test_conversion_within_custom_registry() {
        let registry = UnitRegistry::builder()
            .define(UnitDef::new("second", Dimension::TIME), &["s"])
            .define(UnitDef::new("hour", Dimension::TIME).with_scale(3600.0, 1.0), &[])
            .define(UnitDef::new("eur", Dimension::CURRENCY), &[])
            .build()
            .unwrap();
        let price = CurrencyPerTime::parse_in(&registry, "20 eur/s").unwrap();

        let hourly = price.to_in(&registry, "eur/hour").unwrap();
        assert_eq!(hourly.magnitude(), 72000.0);
        assert_eq!(hourly.unit().to_string(), "eur / hour");

        assert!(price.to("eur/hour").unwrap_err().is_unrecognized_unit());
        assert!(price.to_in(&registry, "eur").unwrap_err().is_dimensionality_mismatch());
    }
}
