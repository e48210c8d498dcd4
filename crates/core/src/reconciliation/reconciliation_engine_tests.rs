#[cfg(test)]
mod tests {
    use crate::accounts::AccountKind;
    use crate::entries::{EntryDetails, NewEntry};
    use crate::errors::Error;
    use crate::ledger::Ledger;
    use crate::reconciliation::{
        match_kind, ConflictKind, ImportCandidate, PostingSignature, ReconciliationConfig,
        ReconciliationEngine, ReconciliationError, ResolvedConflict,
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const ACCOUNT: &str = "checking";

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn cash_ledger(postings: &[(NaiveDate, Decimal)]) -> Ledger {
        let mut ledger = Ledger::new(ACCOUNT, AccountKind::Currency);
        for (posting_date, change) in postings {
            ledger
                .insert(NewEntry::new(
                    ACCOUNT,
                    *posting_date,
                    *change,
                    EntryDetails::currency(Some("Card payment"), None),
                ))
                .unwrap();
        }
        ledger
    }

    fn candidate(posting_date: NaiveDate, change: Decimal) -> ImportCandidate {
        ImportCandidate::currency(posting_date, change, Some("Imported"), Some("ACME Bank"))
    }

    fn stock_candidate(posting_date: NaiveDate, change: Decimal, ticker: &str) -> ImportCandidate {
        ImportCandidate::new(posting_date, change, EntryDetails::stock(ticker, "EQUITY"))
    }

    fn engine() -> ReconciliationEngine {
        ReconciliationEngine::new(ReconciliationConfig::default())
    }

    #[test]
    fn test_exact_duplicate_is_reported_not_imported() {
        let mut ledger = cash_ledger(&[(date(3, 10), dec!(50))]);

        let report = engine().reconcile(&mut ledger, vec![candidate(date(3, 10), dec!(50))]);

        assert_eq!(report.conflicts.len(), 1);
        assert!(report.conflicts[0].is_exact_match);
        assert_eq!(report.conflicts[0].kind, ConflictKind::ExactDuplicate);
        assert_eq!(
            report.conflicts[0].existing.as_ref().map(|e| e.entry_id()),
            Some(0)
        );
        assert!(report.imported.is_empty());
        assert!(report.changes.is_empty());
        assert_eq!(report.exact_matches(), 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_unmatched_candidates_are_imported_with_consistent_balances() {
        let mut ledger = cash_ledger(&[(date(3, 10), dec!(50)), (date(3, 20), dec!(-20))]);

        let report = engine().reconcile(
            &mut ledger,
            vec![
                candidate(date(3, 1), dec!(100)),
                candidate(date(3, 25), dec!(7)),
            ],
        );

        assert!(report.conflicts.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(report.imported.len(), 2);
        assert_eq!(report.imported[0].value(), dec!(100));
        assert_eq!(report.imported[1].value(), dec!(137));

        assert_eq!(ledger.len(), 4);
        ledger.validate().unwrap();
        assert_eq!(ledger.get(1).map(|e| e.value()), Some(dec!(130)));

        // Both stored entries moved, plus the two imports.
        assert_eq!(report.changes.upserts.len(), 4);
        assert!(report.changes.deletions.is_empty());
    }

    #[test]
    fn test_same_day_amount_mismatch_is_flagged() {
        let mut ledger = cash_ledger(&[(date(3, 10), dec!(50))]);

        let report = engine().reconcile(&mut ledger, vec![candidate(date(3, 10), dec!(45))]);

        assert_eq!(report.conflicts.len(), 1);
        let conflict = &report.conflicts[0];
        assert_eq!(conflict.kind, ConflictKind::SameDayAmountMismatch);
        assert!(!conflict.is_exact_match);
        assert!(conflict.reason.contains("45"));
        assert!(report.imported.is_empty());
    }

    #[test]
    fn test_same_day_check_can_be_disabled() {
        let mut ledger = cash_ledger(&[(date(3, 10), dec!(50))]);
        let engine = ReconciliationEngine::new(ReconciliationConfig {
            flag_same_day_amount_mismatch: false,
            ..Default::default()
        });

        let report = engine.reconcile(&mut ledger, vec![candidate(date(3, 10), dec!(45))]);

        assert!(report.conflicts.is_empty());
        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.imported[0].value(), dec!(95));
    }

    #[test]
    fn test_same_amount_on_nearby_date_is_flagged() {
        let mut ledger = cash_ledger(&[(date(3, 10), dec!(50))]);

        let report = engine().reconcile(
            &mut ledger,
            vec![
                candidate(date(3, 12), dec!(50)),
                candidate(date(3, 7), dec!(50)),
                candidate(date(3, 14), dec!(50)),
            ],
        );

        assert_eq!(report.conflicts.len(), 2);
        assert!(report
            .conflicts
            .iter()
            .all(|c| c.kind == ConflictKind::NearbyDateSameAmount));
        assert!(report.conflicts[0].reason.contains("2 day(s)"));

        // 03-12 was not imported, so 03-14 is only compared with 03-10.
        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.imported[0].posting_date(), date(3, 14));
    }

    #[test]
    fn test_strongest_and_nearest_match_wins() {
        let mut ledger = cash_ledger(&[(date(3, 8), dec!(50)), (date(3, 11), dec!(50))]);

        let report = engine().reconcile(
            &mut ledger,
            vec![
                candidate(date(3, 11), dec!(50)),
                candidate(date(3, 10), dec!(50)),
            ],
        );

        assert_eq!(report.conflicts.len(), 2);
        assert_eq!(report.conflicts[0].kind, ConflictKind::ExactDuplicate);
        assert_eq!(
            report.conflicts[0].existing.as_ref().map(|e| e.entry_id()),
            Some(1)
        );
        assert_eq!(report.conflicts[1].kind, ConflictKind::NearbyDateSameAmount);
        assert_eq!(
            report.conflicts[1].existing.as_ref().map(|e| e.entry_id()),
            Some(1)
        );
    }

    #[test]
    fn test_batch_candidates_are_matched_against_earlier_imports() {
        let mut ledger = cash_ledger(&[]);

        let report = engine().reconcile(
            &mut ledger,
            vec![
                candidate(date(4, 1), dec!(200)),
                candidate(date(4, 1), dec!(200)),
            ],
        );

        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.conflicts.len(), 1);
        assert!(report.conflicts[0].is_exact_match);
        assert_eq!(
            report.conflicts[0].existing.as_ref().map(|e| e.entry_id()),
            Some(report.imported[0].entry_id())
        );
    }

    #[test]
    fn test_stock_tickers_must_match() {
        let mut ledger = Ledger::new("brokerage", AccountKind::Stock);
        ledger
            .insert(NewEntry::new(
                "brokerage",
                date(3, 10),
                dec!(1000),
                EntryDetails::stock("AAPL", "EQUITY"),
            ))
            .unwrap();

        let report = engine().reconcile(
            &mut ledger,
            vec![
                stock_candidate(date(3, 10), dec!(1000), "MSFT"),
                stock_candidate(date(3, 10), dec!(1000), "aapl"),
            ],
        );

        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.imported[0].details().ticker(), Some("MSFT"));
        assert_eq!(report.imported[0].value(), dec!(2000));
        assert_eq!(report.conflicts.len(), 1);
        assert!(report.conflicts[0].is_exact_match);
    }

    #[test]
    fn test_exact_and_nearby_matching_share_ticker_normalization() {
        let mut ledger = Ledger::new("brokerage", AccountKind::Stock);
        ledger
            .insert(NewEntry::new(
                "brokerage",
                date(3, 10),
                dec!(1000),
                EntryDetails::stock("ÉTF1", "ETF"),
            ))
            .unwrap();

        let report = engine().reconcile(
            &mut ledger,
            vec![
                stock_candidate(date(3, 10), dec!(1000), "étf1"),
                stock_candidate(date(3, 12), dec!(1000), " étf1 "),
            ],
        );

        assert!(report.imported.is_empty());
        assert_eq!(report.conflicts.len(), 2);
        assert_eq!(report.conflicts[0].kind, ConflictKind::ExactDuplicate);
        assert_eq!(report.conflicts[1].kind, ConflictKind::NearbyDateSameAmount);

        let first = PostingSignature {
            posting_date: date(3, 10),
            value_change: dec!(5),
            ticker: Some("étf1"),
        };
        let second = PostingSignature {
            posting_date: date(3, 10),
            value_change: dec!(5),
            ticker: Some("ÉTF1"),
        };
        assert_eq!(
            match_kind(&ReconciliationConfig::default(), &first, &second),
            Some(ConflictKind::ExactDuplicate)
        );
    }

    #[test]
    fn test_refused_candidates_do_not_stop_the_batch() {
        let mut ledger = cash_ledger(&[(date(3, 10), dec!(50))]);

        let report = engine().reconcile(
            &mut ledger,
            vec![
                stock_candidate(date(3, 20), dec!(10), "AAPL"),
                candidate(date(3, 21), dec!(10)),
            ],
        );

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].candidate.posting_date, date(3, 20));
        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.imported[0].value(), dec!(60));
    }

    #[test]
    fn test_match_kind_is_symmetric() {
        let config = ReconciliationConfig::default();
        let pairs = [
            ((date(3, 10), dec!(50)), (date(3, 10), dec!(50))),
            ((date(3, 10), dec!(50)), (date(3, 10), dec!(40))),
            ((date(3, 10), dec!(50)), (date(3, 13), dec!(50))),
            ((date(3, 10), dec!(50)), (date(3, 20), dec!(50))),
        ];

        for ((a_date, a_change), (b_date, b_change)) in pairs {
            let a = PostingSignature {
                posting_date: a_date,
                value_change: a_change,
                ticker: None,
            };
            let b = PostingSignature {
                posting_date: b_date,
                value_change: b_change,
                ticker: None,
            };
            assert_eq!(match_kind(&config, &a, &b), match_kind(&config, &b, &a));
        }
    }

    #[test]
    fn test_resolution_requires_exactly_one_side() {
        let data = candidate(date(3, 10), dec!(50));

        let both = ResolvedConflict::new(ACCOUNT, true, Some(data.clone()), true, Some(0));
        assert!(matches!(
            both,
            Err(Error::Reconciliation(ReconciliationError::InvalidResolution(_)))
        ));

        let neither = ResolvedConflict::new(ACCOUNT, false, Some(data.clone()), false, Some(0));
        assert!(neither.is_err());

        let no_data = ResolvedConflict::new(ACCOUNT, true, None, false, None);
        assert!(no_data.is_err());

        let add = ResolvedConflict::new(ACCOUNT, true, Some(data.clone()), false, None).unwrap();
        assert!(add.adds_imported());
        assert_eq!(add.import_data(), Some(&data));

        let keep = ResolvedConflict::new(ACCOUNT, false, None, true, Some(4)).unwrap();
        assert!(keep.leaves_existing());
        assert_eq!(keep.existing_id(), Some(4));
    }

    #[test]
    fn test_resolution_is_validated_on_deserialize() {
        let invalid = r#"{"accountId":"checking","addImported":true,"leaveExisting":true}"#;
        assert!(serde_json::from_str::<ResolvedConflict>(invalid).is_err());

        let keep = ResolvedConflict::new(ACCOUNT, false, None, true, Some(2)).unwrap();
        let json = serde_json::to_string(&keep).unwrap();
        assert!(json.contains("\"leaveExisting\":true"));
        assert!(json.contains("\"addImported\":false"));
        let back: ResolvedConflict = serde_json::from_str(&json).unwrap();
        assert_eq!(back, keep);
    }

    #[test]
    fn test_accepting_a_conflict_imports_the_candidate() {
        let mut ledger = cash_ledger(&[(date(3, 10), dec!(50)), (date(3, 20), dec!(5))]);
        let engine = engine();

        let report = engine.reconcile(&mut ledger, vec![candidate(date(3, 10), dec!(50))]);
        let resolution = report.conflicts[0].accept_import().unwrap();
        let result = engine.apply_resolutions(&mut ledger, vec![resolution]);

        assert!(result.errors.is_empty());
        assert_eq!(result.applied.len(), 1);
        assert_eq!(result.applied[0].value(), dec!(100));
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.get_youngest().map(|e| e.value()), Some(dec!(105)));
        ledger.validate().unwrap();
        assert_eq!(result.changes.upserts.len(), 2);
    }

    #[test]
    fn test_resolutions_are_applied_independently() {
        let mut ledger = cash_ledger(&[(date(3, 10), dec!(50))]);
        let engine = engine();

        let add = |account_id: &str, data: ImportCandidate| {
            ResolvedConflict::new(account_id, true, Some(data), false, None).unwrap()
        };
        let resolutions = vec![
            add(ACCOUNT, candidate(date(3, 12), dec!(50))),
            add("savings", candidate(date(3, 13), dec!(1))),
            ResolvedConflict::new(ACCOUNT, false, None, true, Some(0)).unwrap(),
            add(
                ACCOUNT,
                ImportCandidate::new(date(3, 14), dec!(1), EntryDetails::bond("EDO")),
            ),
        ];

        let result = engine.apply_resolutions(&mut ledger, resolutions);

        assert_eq!(result.applied.len(), 1);
        assert_eq!(result.skipped, 1);
        let failed: Vec<usize> = result.errors.iter().map(|e| e.index).collect();
        assert_eq!(failed, vec![1, 3]);
        assert_eq!(ledger.len(), 2);
        ledger.validate().unwrap();
    }
}
