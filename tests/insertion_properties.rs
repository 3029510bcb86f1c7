//! Property tests for text insertion.

use cadence::{InsertOptions, insert_into_string};
use proptest::prelude::*;

fn text() -> impl Strategy<Value = String> {
    "[a-z \n]{0,40}"
}

fn snippet() -> impl Strategy<Value = String> {
    "[0-9]{1,8}"
}

proptest! {
    #[test]
    fn prop_insert_is_idempotent_without_force(source in text(), insertion in snippet()) {
        let options = InsertOptions::default();
        let once = insert_into_string(&source, &insertion, &options);
        let twice = insert_into_string(&once.contents, &insertion, &options);

        prop_assert!(!twice.inserted);
        prop_assert_eq!(twice.contents, once.contents);
    }

    #[test]
    fn prop_end_anchor_appends(source in text(), insertion in snippet()) {
        let result = insert_into_string(&source, &insertion, &InsertOptions::default());

        prop_assert!(result.inserted);
        prop_assert_eq!(result.contents, format!("{source}{insertion}"));
    }

    #[test]
    fn prop_force_always_inserts(source in text(), insertion in snippet()) {
        let seeded = format!("{source}{insertion}");
        let result = insert_into_string(&seeded, &insertion, &InsertOptions::default().force(true));

        prop_assert!(result.inserted);
        prop_assert_eq!(result.contents.len(), seeded.len() + insertion.len());
    }

    #[test]
    fn prop_before_marker_splices_at_first_match(
        head in text(),
        tail in text(),
        insertion in snippet(),
    ) {
        let source = format!("{head}#MARK#{tail}");
        let result = insert_into_string(&source, &insertion, &InsertOptions::before("#MARK#"));

        let at = source.find("#MARK#").unwrap();
        prop_assert_eq!(
            result.contents,
            format!("{}{insertion}\n{}", &source[..at], &source[at..])
        );
    }

    #[test]
    fn prop_after_marker_splices_past_first_match(
        head in text(),
        tail in text(),
        insertion in snippet(),
    ) {
        let source = format!("{head}#MARK#{tail}#MARK#");
        let result = insert_into_string(
            &source,
            &insertion,
            &InsertOptions::after("#MARK#").eol("\r\n"),
        );

        let end = source.find("#MARK#").unwrap() + "#MARK#".len();
        prop_assert_eq!(
            result.contents,
            format!("{}{insertion}\r\n{}", &source[..end], &source[end..])
        );
    }

    #[test]
    fn prop_missing_marker_changes_nothing(source in text(), insertion in snippet()) {
        let result = insert_into_string(&source, &insertion, &InsertOptions::before("#MARK#"));

        prop_assert!(!result.inserted);
        prop_assert_eq!(result.contents, source);
    }
}
