// Records produced by built aligners, as seen by downstream consumers:
// packed layout, CIGAR/NM/MD, merged statistics and protein mode.

use ferrous_edit::core::alignment::actions::{ACTIONS_LENGTH_INDEX, SCORE_INDEX, TEMPLATE_START_INDEX};
use ferrous_edit::core::alignment::chain::ChainStats;
use ferrous_edit::core::alignment::cigar;
use ferrous_edit::core::compute::encoding::{ResidueAlphabet, reverse_complement};
use ferrous_edit::edit_opt::{Platform, ReadLengthStats};
use ferrous_edit::error::ConfigError;
use ferrous_edit::{AlignmentRecord, EditDistanceFactory, EditOpt, MAX_SCORE};

fn enc(s: &str) -> Vec<u8> {
    ResidueAlphabet::Nucleotide.encode_sequence(s.as_bytes())
}

const TEMPLATE: &str = "TTGACCGATCGGATTACAGCTTAGCCATGCAAGTCGATCGGTTACCAGTCAAGCTTGAC";

#[test]
fn test_deletion_record_interchange() {
    let template = enc(TEMPLATE);
    // template[10..40] with the four bases at 20..24 deleted
    let mut read = template[10..20].to_vec();
    read.extend_from_slice(&template[24..40]);

    let opt = EditOpt {
        read_length: ReadLengthStats::fixed(read.len()),
        ..Default::default()
    };
    let mut aligner = EditDistanceFactory::new(opt).unwrap().build();
    aligner.set_template(template.clone().into());
    let rec = aligner.calculate_edit_distance(&read, read.len(), 10, false, 30, 5, false);

    assert_eq!(rec.score(), 23);
    assert_eq!(rec.template_start(), 10);
    assert_eq!(rec.reference_span(), 30);
    assert_eq!(rec.indel_length(), 4);

    let ops = cigar::sam_cigar_ops(rec.actions());
    assert_eq!(cigar::reference_length(&ops), 30);
    assert_eq!(cigar::query_length(&ops), 26);
    assert_eq!(cigar::compute_nm_only(&rec), 4);

    let packed = rec.to_packed();
    assert_eq!(packed[SCORE_INDEX], 23);
    assert_eq!(packed[TEMPLATE_START_INDEX], 10);
    assert_eq!(packed[ACTIONS_LENGTH_INDEX], 30);
    assert_eq!(AlignmentRecord::from_packed(&packed).unwrap(), rec);
}

#[test]
fn test_reverse_record_has_forward_md() {
    let template = enc(TEMPLATE);
    let mut forward_read = template[15..45].to_vec();
    forward_read[12] = (forward_read[12] + 2) % 4;
    let read = reverse_complement(&forward_read);

    let opt = EditOpt {
        read_length: ReadLengthStats::fixed(30),
        ..Default::default()
    };
    let mut aligner = EditDistanceFactory::new(opt).unwrap().build();
    aligner.set_template(template.clone().into());
    let rec = aligner.calculate_edit_distance(&read, 30, 15, true, 20, 3, false);

    assert_eq!(rec.score(), 9);
    assert_eq!(rec.template_start(), 15);
    let (nm, md) = cigar::compute_nm_and_md(&rec, &template);
    assert_eq!(nm, 1);
    let reference_base = ResidueAlphabet::Nucleotide.code_to_char(template[27]);
    assert_eq!(md, format!("12{}17", reference_base));
    assert_eq!(cigar::extended_cigar(rec.actions()), "12=1X17=");
}

#[test]
fn test_sentinel_packs_as_max() {
    let template = enc(TEMPLATE);
    let read = enc("GGGGGGGGGGGGGGGGGGGG");
    let mut aligner = EditDistanceFactory::new(EditOpt::default()).unwrap().build();
    aligner.set_template(template.into());
    let rec = aligner.calculate_edit_distance(&read, 20, 8, false, 10, 2, false);
    assert!(rec.is_sentinel());
    let packed = rec.to_packed();
    assert_eq!(packed, vec![MAX_SCORE, 8, 0]);
}

#[test]
fn test_worker_statistics_merge() {
    let template = enc(TEMPLATE);
    let factory = EditDistanceFactory::new(EditOpt {
        read_length: ReadLengthStats::fixed(20),
        ..Default::default()
    })
    .unwrap();

    let mut merged = ChainStats::default();
    for worker in 0..3 {
        let mut aligner = factory.build();
        aligner.set_template(template.clone().into());
        for start in 0..(worker + 2) {
            let read = template[start..start + 20].to_vec();
            let rec = aligner.calculate_edit_distance(&read, 20, start as i32, false, 10, 2, false);
            assert_eq!(rec.score(), 0);
        }
        merged.merge(aligner.forward_stats().unwrap());
    }
    // 2 + 3 + 4 queries, all decided by the first stage
    assert_eq!(merged.total_calls(), 9);
    assert_eq!(merged.stages[0].name, "no-indels");
    assert_eq!(merged.stages[0].committed(), 9);
    assert_eq!(merged.stages[1].calls, 0);
    assert!(merged.report("forward").contains("no-indels"));
}

#[test]
fn test_protein_substitution_uses_matrix() {
    let protein = ResidueAlphabet::Protein;
    let template = protein.encode_sequence(b"MKTAYIAKQRQISFVKSHFSRQ");
    // TAYIAKQRQISF with the first A replaced by S: BLOSUM62 A/S costs 4 - 1
    let read = protein.encode_sequence(b"TSYIAKQRQISF");

    let mut opt = EditOpt::default();
    opt.use_protein_defaults();
    let factory = EditDistanceFactory::new(opt).unwrap();
    let mut aligner = factory.build();
    aligner.set_template(template.into());

    let rec = aligner.calculate_edit_distance(&read, read.len(), 2, false, 20, 2, false);
    assert_eq!(rec.score(), 3);
    assert_eq!(rec.template_start(), 2);
    assert_eq!(cigar::compute_nm_only(&rec), 1);
}

#[test]
fn test_configuration_rejected_before_building() {
    let opt = EditOpt {
        platform: Platform::CompleteGenomicsLegacy,
        read_length: ReadLengthStats::new(35, 40),
        ..Default::default()
    };
    assert!(matches!(
        EditDistanceFactory::new(opt),
        Err(ConfigError::FixedReadLength { expected: 35, min: 35, max: 40, .. })
    ));

    let mut opt = EditOpt::default();
    opt.penalties.substitution = 0;
    assert_eq!(
        EditDistanceFactory::new(opt).unwrap_err(),
        ConfigError::NonPositiveSubstitution(0)
    );
}
