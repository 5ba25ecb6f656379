//! # Residue Encoding
//!
//! Reads and templates reach the edit-distance engine as byte arrays of small
//! residue codes. Two alphabets are supported:
//!
//! - **Nucleotide**: A=0, C=1, G=2, T=3, N=4. Any code of 4 or above is unknown.
//! - **Protein**: BLOSUM62 matrix order `ARNDCQEGHILKMFPSTWYVBJZX*`, X (23) is unknown.
//!
//! Unknown residues are valid input but never "match" anything under scoring.

/// Code for the unknown nucleotide (N).
pub const UNKNOWN_NUCLEOTIDE: u8 = 4;

/// Code for the unknown amino acid (X) in BLOSUM62 order.
pub const UNKNOWN_AMINO_ACID: u8 = 23;

/// Number of residue codes in the protein alphabet.
pub const PROTEIN_ALPHABET_SIZE: usize = 25;

const PROTEIN_SYMBOLS: &[u8; PROTEIN_ALPHABET_SIZE] = b"ARNDCQEGHILKMFPSTWYVBJZX*";

/// Residue alphabet of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResidueAlphabet {
    /// 2-bit nucleotides plus N. Has a reverse-complement notion.
    #[default]
    Nucleotide,
    /// Amino acids. No reverse complement.
    Protein,
}

impl ResidueAlphabet {
    /// The reserved "unknown" code of this alphabet.
    #[inline]
    pub const fn unknown_code(self) -> u8 {
        match self {
            ResidueAlphabet::Nucleotide => UNKNOWN_NUCLEOTIDE,
            ResidueAlphabet::Protein => UNKNOWN_AMINO_ACID,
        }
    }

    /// Returns true if `code` is the unknown residue (or out of the alphabet).
    #[inline]
    pub const fn is_unknown(self, code: u8) -> bool {
        match self {
            ResidueAlphabet::Nucleotide => code >= UNKNOWN_NUCLEOTIDE,
            ResidueAlphabet::Protein => {
                code == UNKNOWN_AMINO_ACID || code as usize >= PROTEIN_ALPHABET_SIZE
            }
        }
    }

    /// Encode an ASCII sequence into residue codes.
    pub fn encode_sequence(self, seq: &[u8]) -> Vec<u8> {
        match self {
            ResidueAlphabet::Nucleotide => seq.iter().map(|&b| nucleotide_to_code(b)).collect(),
            ResidueAlphabet::Protein => seq.iter().map(|&b| amino_acid_to_code(b)).collect(),
        }
    }

    /// Decode a residue code to its display character.
    #[inline]
    pub fn code_to_char(self, code: u8) -> char {
        match self {
            ResidueAlphabet::Nucleotide => nucleotide_to_char(code),
            ResidueAlphabet::Protein => PROTEIN_SYMBOLS
                .get(code as usize)
                .map_or('X', |&b| b as char),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ResidueAlphabet::Nucleotide => "nucleotide",
            ResidueAlphabet::Protein => "protein",
        }
    }
}

/// Convert ASCII base to nucleotide code.
///
/// - A/a → 0
/// - C/c → 1
/// - G/g → 2
/// - T/t → 3
/// - N/n/other → 4
#[inline]
pub fn nucleotide_to_code(base: u8) -> u8 {
    match base {
        b'A' | b'a' => 0,
        b'C' | b'c' => 1,
        b'G' | b'g' => 2,
        b'T' | b't' => 3,
        _ => UNKNOWN_NUCLEOTIDE,
    }
}

/// Convert nucleotide code back to ASCII.
#[inline(always)]
pub const fn nucleotide_to_char(code: u8) -> char {
    match code {
        0 => 'A',
        1 => 'C',
        2 => 'G',
        3 => 'T',
        _ => 'N',
    }
}

/// Complement of a nucleotide code (A↔T, C↔G, N→N).
#[inline]
pub fn complement_code(code: u8) -> u8 {
    match code {
        0 => 3,
        1 => 2,
        2 => 1,
        3 => 0,
        _ => UNKNOWN_NUCLEOTIDE,
    }
}

/// Convert ASCII amino acid to its BLOSUM62-order code; unrecognised letters map to X.
#[inline]
pub fn amino_acid_to_code(aa: u8) -> u8 {
    let upper = aa.to_ascii_uppercase();
    PROTEIN_SYMBOLS
        .iter()
        .position(|&s| s == upper)
        .map_or(UNKNOWN_AMINO_ACID, |p| p as u8)
}

/// Reverse complement of an encoded nucleotide sequence.
pub fn reverse_complement(encoded: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded.len());
    reverse_complement_into(encoded, &mut out);
    out
}

/// Reverse complement into an existing buffer, reusing its capacity.
pub fn reverse_complement_into(encoded: &[u8], out: &mut Vec<u8>) {
    out.clear();
    out.extend(encoded.iter().rev().map(|&code| complement_code(code)));
}

/// Residue at `pos`, or the unknown code when `pos` lies outside the sequence.
#[inline(always)]
pub fn code_at(seq: &[u8], pos: i64, unknown: u8) -> u8 {
    if pos < 0 || pos >= seq.len() as i64 {
        unknown
    } else {
        seq[pos as usize]
    }
}

/// Render encoded residues as a string (used by diagnostics and tests).
pub fn decode_sequence(alphabet: ResidueAlphabet, codes: &[u8]) -> String {
    codes.iter().map(|&c| alphabet.code_to_char(c)).collect()
}
