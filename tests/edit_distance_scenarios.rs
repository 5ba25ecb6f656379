// Concrete alignment scenarios through the public API.

use ferrous_edit::core::alignment::actions::{Action, AlignmentRecord};
use ferrous_edit::core::alignment::affine_gap::AffineGapAligner;
use ferrous_edit::core::alignment::aligner::{AlignQuery, EditDistance};
use ferrous_edit::core::alignment::no_indels::NoIndelsAligner;
use ferrous_edit::core::alignment::penalties::Penalties;
use ferrous_edit::core::alignment::seed::SeedShifter;
use ferrous_edit::core::compute::encoding::{ResidueAlphabet, nucleotide_to_code};
use ferrous_edit::edit_opt::ReadLengthStats;
use ferrous_edit::{EditDistanceFactory, EditOpt};

fn enc(s: &str) -> Vec<u8> {
    ResidueAlphabet::Nucleotide.encode_sequence(s.as_bytes())
}

fn penalties() -> Penalties {
    Penalties::new(9, 5, 19, 1)
}

#[test]
fn test_exact_match_scores_zero() {
    let read = enc("ACGT");
    let template = enc("ACGT");
    let mut fast = NoIndelsAligner::new(penalties());
    let rec = fast
        .align(&AlignQuery::new(&read, 4, &template, 0, 5, 0))
        .expect("exact match must be decided by the fast aligner");
    assert_eq!(rec.score(), 0);
    assert_eq!(rec.template_start(), 0);
    assert_eq!(rec.actions(), &[Action::Same; 4]);
}

#[test]
fn test_single_substitution() {
    let read = enc("ACGA");
    let template = enc("ACGT");
    let expected = [Action::Same, Action::Same, Action::Same, Action::Mismatch];

    let mut fast = NoIndelsAligner::new(penalties());
    let rec = fast
        .align(&AlignQuery::new(&read, 4, &template, 0, 10, 0))
        .unwrap();
    assert_eq!(rec.score(), 9);
    assert_eq!(rec.actions(), &expected);

    let mut affine = AffineGapAligner::new(penalties());
    let rec = affine
        .align(&AlignQuery::new(&read, 4, &template, 0, 10, 0))
        .unwrap();
    assert_eq!(rec.score(), 9);
    assert_eq!(rec.actions(), &expected);
}

#[test]
fn test_scenarios_through_the_wrapper() {
    let opt = EditOpt {
        read_length: ReadLengthStats::fixed(4),
        ..Default::default()
    };
    let mut aligner = EditDistanceFactory::new(opt).unwrap().build();
    aligner.set_template(enc("ACGT").into());

    let rec = aligner.calculate_edit_distance(&enc("ACGT"), 4, 0, false, 5, 0, false);
    assert_eq!(rec, AlignmentRecord::new(0, 0, vec![Action::Same; 4]));

    let rec = aligner.calculate_edit_distance(&enc("ACGA"), 4, 0, false, 10, 0, false);
    assert_eq!(rec.score(), 9);

    // TCGT is the reverse complement of ACGA
    let rec = aligner.calculate_edit_distance(&enc("TCGT"), 4, 0, true, 10, 0, false);
    assert_eq!(rec.score(), 9);
    assert_eq!(rec.template_start(), 0);
    assert_eq!(
        rec.actions(),
        &[Action::Same, Action::Same, Action::Same, Action::Mismatch]
    );
}

#[test]
fn test_unknown_base_in_read_span() {
    let template = enc("GGCATGCTAGCTAGGATCCATGACTGATCGTAGCTAGCATCGATGCAGTCAGTAC");
    let read = template[3..53].to_vec();
    let mut with_n = template.clone();
    with_n[20] = nucleotide_to_code(b'N');

    let q = AlignQuery::new(&read, 50, &with_n, 3, 3, 2);
    let mut fast = NoIndelsAligner::new(penalties());
    assert!(fast.align(&q).is_none());

    let mut affine = AffineGapAligner::new(penalties());
    assert!(affine.align(&q).unwrap().is_sentinel());

    let roomy = AlignQuery { max_score: 10, ..q };
    let rec = affine.align(&roomy).unwrap();
    assert_eq!(rec.score(), penalties().unknown);
    assert_eq!(rec.template_start(), 3);
    assert_eq!(rec.count(Action::Mismatch), 1);
    assert_eq!(rec.count(Action::Same), 49);
}

#[test]
fn test_seed_register_recovers_after_unknown() {
    let mut seed = SeedShifter::new(3);
    let validity: Vec<bool> = enc("AANAAA")
        .into_iter()
        .map(|code| {
            seed.step(code);
            seed.is_valid()
        })
        .collect();
    // invalid while the N is among the last three bases
    assert_eq!(validity, vec![false, false, false, false, false, true]);
    assert_eq!(seed.seed(), Some(0));
}
