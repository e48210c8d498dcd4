#[cfg(test)]
mod tests {
    use crate::accounts::AccountKind;
    use crate::bonds::{
        compute_daily_value, AccrualError, AccrualService, AccrualServiceTrait, BondDetails,
        BondDetailsRepositoryTrait, CalculationMethod, CapitalizationMethod, DateOperator,
    };
    use crate::constants::DISPLAY_DECIMAL_PRECISION;
    use crate::entries::{EntryDetails, NewEntry};
    use crate::errors::Error;
    use crate::errors::Result;
    use crate::ledger::{InMemoryEntryRepository, Ledger};
    use std::sync::Arc;
    use chrono::{Duration, NaiveDate};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const ACCOUNT: &str = "bonds";
    const BOND_ID: &str = "ROR-2025";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flat_bond(rate: Decimal) -> BondDetails {
        BondDetails {
            id: BOND_ID.to_string(),
            name: "Flat rate bond".to_string(),
            capitalization: CapitalizationMethod::Annual,
            calculation_methods: vec![CalculationMethod::new(
                DateOperator::GreaterOrEqual,
                0,
                rate,
            )],
        }
    }

    fn purchase(posting_date: NaiveDate, change: Decimal) -> NewEntry {
        NewEntry::new(ACCOUNT, posting_date, change, EntryDetails::bond(BOND_ID))
    }

    fn ledger_with(purchases: &[(NaiveDate, Decimal)]) -> Ledger {
        let mut ledger = Ledger::new(ACCOUNT, AccountKind::Bond);
        for (posting_date, change) in purchases {
            ledger.insert(purchase(*posting_date, *change)).unwrap();
        }
        ledger
    }

    #[test]
    fn test_daily_accrual_from_anchor() {
        let start = date(2024, 1, 1);
        let ledger = ledger_with(&[(start, dec!(100))]);

        let series = compute_daily_value(
            start,
            start + Duration::days(2),
            &ledger,
            &[flat_bond(dec!(0.0365))],
        )
        .unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series[&start], dec!(100));
        assert_eq!(
            series[&(start + Duration::days(1))].round_dp(DISPLAY_DECIMAL_PRECISION),
            dec!(100.01)
        );
        assert_eq!(
            series[&(start + Duration::days(2))].round_dp(DISPLAY_DECIMAL_PRECISION),
            dec!(100.02)
        );
    }

    #[test]
    fn test_annual_capitalization_compounds_interest() {
        let start = date(2023, 1, 1);
        let ledger = ledger_with(&[(start, dec!(100))]);
        let bond = flat_bond(dec!(0.0365));

        let series = compute_daily_value(
            start,
            start + Duration::days(366),
            &ledger,
            &[bond],
        )
        .unwrap();

        assert_eq!(series[&(start + Duration::days(365))], dec!(103.65));
        assert_eq!(series[&(start + Duration::days(366))], dec!(103.660365));
    }

    #[test]
    fn test_rate_schedule_switches_after_boundary() {
        let start = date(2023, 1, 1);
        let ledger = ledger_with(&[(start, dec!(100))]);
        let bond = BondDetails {
            id: BOND_ID.to_string(),
            name: "Step-up bond".to_string(),
            capitalization: CapitalizationMethod::Annual,
            calculation_methods: vec![
                CalculationMethod::new(DateOperator::LessOrEqual, 365, dec!(0.0365)),
                CalculationMethod::new(DateOperator::GreaterThan, 365, dec!(0.073)),
            ],
        };

        let series = compute_daily_value(
            start,
            start + Duration::days(366),
            &ledger,
            &[bond],
        )
        .unwrap();

        assert_eq!(series[&(start + Duration::days(366))], dec!(103.67073));
    }

    #[test]
    fn test_series_is_limited_to_requested_range() {
        let anchor = date(2024, 1, 1);
        let ledger = ledger_with(&[(anchor, dec!(100))]);

        let series = compute_daily_value(
            date(2024, 1, 5),
            date(2024, 1, 6),
            &ledger,
            &[flat_bond(dec!(0.0365))],
        )
        .unwrap();

        let days: Vec<NaiveDate> = series.keys().copied().collect();
        assert_eq!(days, vec![date(2024, 1, 5), date(2024, 1, 6)]);
        assert_eq!(series[&date(2024, 1, 5)], dec!(100.04));
    }

    #[test]
    fn test_days_before_first_entry_are_omitted() {
        let anchor = date(2024, 1, 1);
        let ledger = ledger_with(&[(anchor, dec!(100))]);

        let series = compute_daily_value(
            date(2023, 12, 25),
            date(2024, 1, 1),
            &ledger,
            &[flat_bond(dec!(0.0365))],
        )
        .unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[&anchor], dec!(100));
    }

    #[test]
    fn test_later_contribution_re_anchors_calculation() {
        let ledger = ledger_with(&[
            (date(2024, 1, 1), dec!(100)),
            (date(2024, 1, 11), dec!(50)),
        ]);

        let series = compute_daily_value(
            date(2024, 1, 1),
            date(2024, 1, 12),
            &ledger,
            &[flat_bond(dec!(0.0365))],
        )
        .unwrap();

        assert_eq!(series[&date(2024, 1, 10)], dec!(100.09));
        assert_eq!(series[&date(2024, 1, 11)], dec!(150));
        assert_eq!(series[&date(2024, 1, 12)], dec!(150.015));
        assert_eq!(series.len(), 12);
    }

    #[test]
    fn test_unresolved_calculation_method_fails() {
        let start = date(2024, 1, 1);
        let ledger = ledger_with(&[(start, dec!(100))]);
        let bond = BondDetails {
            id: BOND_ID.to_string(),
            name: "Short schedule".to_string(),
            capitalization: CapitalizationMethod::Annual,
            calculation_methods: vec![CalculationMethod::new(
                DateOperator::LessThan,
                10,
                dec!(0.05),
            )],
        };

        let err = compute_daily_value(start, start + Duration::days(15), &ledger, &[bond])
            .unwrap_err();

        match err {
            Error::Accrual(AccrualError::UnresolvedCalculationMethod {
                date: failed_on,
                elapsed_days,
                ..
            }) => {
                assert_eq!(failed_on, start + Duration::days(10));
                assert_eq!(elapsed_days, 10);
            }
            other => panic!("Expected UnresolvedCalculationMethod, got {:?}", other),
        }
    }

    #[test]
    fn test_non_annual_capitalization_is_not_implemented() {
        let start = date(2024, 1, 1);
        let ledger = ledger_with(&[(start, dec!(100))]);
        let mut bond = flat_bond(dec!(0.05));
        bond.capitalization = CapitalizationMethod::Monthly;

        let err = compute_daily_value(start, start, &ledger, &[bond]).unwrap_err();
        assert!(matches!(
            err,
            Error::Accrual(AccrualError::NotImplemented(CapitalizationMethod::Monthly))
        ));
    }

    #[test]
    fn test_missing_bond_details_fails() {
        let start = date(2024, 1, 1);
        let ledger = ledger_with(&[(start, dec!(100))]);

        let err = compute_daily_value(start, start, &ledger, &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::Accrual(AccrualError::MissingBondDetails(_))
        ));
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let start = date(2024, 1, 1);
        let bonds = [flat_bond(dec!(0.05))];

        let empty = Ledger::new(ACCOUNT, AccountKind::Bond);
        assert!(matches!(
            compute_daily_value(start, start, &empty, &bonds).unwrap_err(),
            Error::Accrual(AccrualError::EmptyLedger(_))
        ));

        let cash = Ledger::new(ACCOUNT, AccountKind::Currency);
        assert!(matches!(
            compute_daily_value(start, start, &cash, &bonds).unwrap_err(),
            Error::Accrual(AccrualError::NotBondLedger(AccountKind::Currency))
        ));

        let ledger = ledger_with(&[(start, dec!(100))]);
        assert!(matches!(
            compute_daily_value(start + Duration::days(1), start, &ledger, &bonds).unwrap_err(),
            Error::Accrual(AccrualError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_calculation_does_not_mutate_ledger() {
        let ledger = ledger_with(&[(date(2024, 1, 1), dec!(100))]);
        let before = ledger.to_entries();

        compute_daily_value(
            date(2024, 1, 1),
            date(2024, 3, 1),
            &ledger,
            &[flat_bond(dec!(0.05))],
        )
        .unwrap();

        assert_eq!(ledger.to_entries(), before);
    }

    struct StaticBondDetailsRepository {
        details: Vec<BondDetails>,
    }

    impl BondDetailsRepositoryTrait for StaticBondDetailsRepository {
        fn get_bond_details(&self, ids: &[String]) -> Result<Vec<BondDetails>> {
            Ok(self
                .details
                .iter()
                .filter(|details| ids.contains(&details.id))
                .cloned()
                .collect())
        }
    }

    fn accrual_service(ledger: &Ledger, rate: Decimal) -> AccrualService {
        let entries = InMemoryEntryRepository::new();
        entries.add_account(ACCOUNT, AccountKind::Bond).unwrap();
        entries.seed_entries(ACCOUNT, ledger.to_entries()).unwrap();
        let bonds = StaticBondDetailsRepository {
            details: vec![flat_bond(rate)],
        };
        AccrualService::new(Arc::new(entries), Arc::new(bonds))
    }

    #[tokio::test]
    async fn test_service_projects_stored_ledger() {
        let anchor = date(2024, 1, 1);
        let ledger = ledger_with(&[(anchor, dec!(100)), (date(2024, 1, 11), dec!(50))]);
        let service = accrual_service(&ledger, dec!(0.0365));

        let series = service
            .compute_daily_value(ACCOUNT, anchor, date(2024, 1, 12))
            .await
            .unwrap();
        assert_eq!(series[&date(2024, 1, 12)], dec!(150.015));

        let value = service.value_on(ACCOUNT, date(2024, 1, 3)).await.unwrap();
        assert_eq!(value, Some(dec!(100.02)));

        let before_first = service.value_on(ACCOUNT, date(2023, 6, 1)).await.unwrap();
        assert_eq!(before_first, None);
    }

    #[tokio::test]
    async fn test_service_rejects_unknown_account() {
        let ledger = ledger_with(&[(date(2024, 1, 1), dec!(100))]);
        let service = accrual_service(&ledger, dec!(0.0365));

        let result = service.value_on("missing", date(2024, 1, 1)).await;
        assert!(result.is_err());
    }
}
