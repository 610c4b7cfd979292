//! Sample sex assignment and the male column set derived from the `#CHROM`
//! header.

use std::{
    collections::HashSet,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use serde::Serialize;
use thiserror::Error;

/// Index of the first sample column in a VCF record.
pub const FIRST_SAMPLE_COLUMN: usize = 9;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Match a free-text label by substring, e.g. `Male`, `female_adult`.
    ///
    /// `female` is tested first since every female label also contains `male`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.to_ascii_lowercase();
        if label.contains("female") {
            Some(Self::Female)
        } else if label.contains("male") {
            Some(Self::Male)
        } else {
            None
        }
    }
}

/// What to do with a sex assignment row whose label is neither male nor female.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum SexLabelPolicy {
    /// Fail the run.
    #[default]
    Reject,
    /// Drop the sample from the assignment and log a warning.
    Skip,
}

#[derive(Debug, Error)]
pub enum SexAssignmentError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: expected a sample name and a sex label separated by a tab")]
    MalformedLine { line: u64 },
    #[error("line {line}: sex label '{label}' of sample {sample} contains neither 'female' nor 'male'")]
    MissingSexLabel {
        line: u64,
        sample: String,
        label: String,
    },
}

/// Sample name to sex mapping, in file order.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SexAssignment {
    entries: Vec<(String, Sex)>,
}

impl SexAssignment {
    pub fn from_path(path: &Path, policy: SexLabelPolicy) -> Result<Self, SexAssignmentError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), policy)
    }

    pub fn from_reader<R>(reader: R, policy: SexLabelPolicy) -> Result<Self, SexAssignmentError>
    where
        R: BufRead,
    {
        let mut entries = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = index as u64 + 1;
            let trimmed = line.trim_end_matches('\r');
            if trimmed.trim().is_empty() {
                continue;
            }

            let mut fields = trimmed.split('\t');
            let (Some(sample), Some(label)) = (fields.next(), fields.next()) else {
                return Err(SexAssignmentError::MalformedLine { line: line_number });
            };

            match Sex::from_label(label) {
                Some(sex) => entries.push((sample.to_string(), sex)),
                None => match policy {
                    SexLabelPolicy::Reject => {
                        return Err(SexAssignmentError::MissingSexLabel {
                            line: line_number,
                            sample: sample.to_string(),
                            label: label.to_string(),
                        });
                    }
                    SexLabelPolicy::Skip => {
                        tracing::warn!(
                            line = line_number,
                            sample,
                            label,
                            "sex label is neither male nor female; excluding sample"
                        );
                    }
                },
            }
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, Sex)] {
        &self.entries
    }

    pub fn males(&self) -> impl Iterator<Item = &str> {
        self.with_sex(Sex::Male)
    }

    pub fn females(&self) -> impl Iterator<Item = &str> {
        self.with_sex(Sex::Female)
    }

    fn with_sex(&self, sex: Sex) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |(_, s)| *s == sex)
            .map(|(name, _)| name.as_str())
    }
}

impl<S> FromIterator<(S, Sex)> for SexAssignment
where
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, Sex)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, sex)| (name.into(), sex))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum SampleError {
    #[error("#CHROM header lists no sample columns")]
    NoSamples,
    #[error(
        "the name and number of samples must be consistent between the VCF header ({header_count} samples) and the sex assignment file ({assignment_count} samples){}",
        describe_differences(.missing_from_header, .missing_from_assignment)
    )]
    ConfigurationMismatch {
        header_count: usize,
        assignment_count: usize,
        missing_from_header: Vec<String>,
        missing_from_assignment: Vec<String>,
    },
}

fn describe_differences(missing_from_header: &[String], missing_from_assignment: &[String]) -> String {
    let mut out = String::new();
    if !missing_from_header.is_empty() {
        out.push_str(&format!(
            "; not in VCF header: {}",
            missing_from_header.join(", ")
        ));
    }
    if !missing_from_assignment.is_empty() {
        out.push_str(&format!(
            "; not in sex assignment: {}",
            missing_from_assignment.join(", ")
        ));
    }
    out
}

/// Column positions of the male samples of a file, fixed once the header is read.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MaleColumns {
    sample_names: Vec<String>,
    columns: Vec<usize>,
    mask: Vec<bool>,
}

impl MaleColumns {
    /// Resolve male columns from a `#CHROM` header line.
    ///
    /// Without an assignment every sample is taken to be male.
    pub fn from_header(
        header: &str,
        assignment: Option<&SexAssignment>,
    ) -> Result<Self, SampleError> {
        let sample_names: Vec<String> = header
            .split('\t')
            .skip(FIRST_SAMPLE_COLUMN)
            .map(str::to_string)
            .collect();

        if sample_names.is_empty() {
            return Err(SampleError::NoSamples);
        }

        let columns: Vec<usize> = match assignment {
            None => (FIRST_SAMPLE_COLUMN..FIRST_SAMPLE_COLUMN + sample_names.len()).collect(),
            Some(assignment) => {
                ensure_same_samples(&sample_names, assignment)?;
                let mut columns = assignment
                    .males()
                    .map(|name| {
                        locate_sample(&sample_names, name)
                            .ok_or_else(|| mismatch(&sample_names, assignment))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                columns.sort_unstable();
                columns.dedup();
                columns
            }
        };

        let mut mask = vec![false; FIRST_SAMPLE_COLUMN + sample_names.len()];
        for &column in &columns {
            mask[column] = true;
        }

        Ok(Self {
            sample_names,
            columns,
            mask,
        })
    }

    /// Male column positions in header order.
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    pub fn is_male(&self, column: usize) -> bool {
        self.mask.get(column).copied().unwrap_or(false)
    }

    pub fn sample_name(&self, column: usize) -> Option<&str> {
        column
            .checked_sub(FIRST_SAMPLE_COLUMN)
            .and_then(|index| self.sample_names.get(index))
            .map(String::as_str)
    }

    pub fn male_count(&self) -> usize {
        self.columns.len()
    }

    pub fn sample_count(&self) -> usize {
        self.sample_names.len()
    }
}

fn ensure_same_samples(
    sample_names: &[String],
    assignment: &SexAssignment,
) -> Result<(), SampleError> {
    if assignment.len() != sample_names.len() {
        return Err(mismatch(sample_names, assignment));
    }

    let header: HashSet<&str> = sample_names.iter().map(String::as_str).collect();
    let assigned: HashSet<&str> = assignment
        .entries()
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    if header != assigned {
        return Err(mismatch(sample_names, assignment));
    }

    Ok(())
}

fn locate_sample(sample_names: &[String], name: &str) -> Option<usize> {
    sample_names
        .iter()
        .position(|sample| sample == name)
        .map(|index| index + FIRST_SAMPLE_COLUMN)
}

fn mismatch(sample_names: &[String], assignment: &SexAssignment) -> SampleError {
    let header: HashSet<&str> = sample_names.iter().map(String::as_str).collect();
    let assigned: HashSet<&str> = assignment
        .entries()
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();

    let mut missing_from_header: Vec<String> = assigned
        .difference(&header)
        .map(|name| name.to_string())
        .collect();
    let mut missing_from_assignment: Vec<String> = header
        .difference(&assigned)
        .map(|name| name.to_string())
        .collect();
    missing_from_header.sort();
    missing_from_assignment.sort();

    SampleError::ConfigurationMismatch {
        header_count: sample_names.len(),
        assignment_count: assignment.len(),
        missing_from_header,
        missing_from_assignment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2\tS3";

    #[test]
    fn labels_match_by_substring() {
        assert_eq!(Sex::from_label("male"), Some(Sex::Male));
        assert_eq!(Sex::from_label("female"), Some(Sex::Female));
        assert_eq!(Sex::from_label("Female (confirmed)"), Some(Sex::Female));
        assert_eq!(Sex::from_label("MALE"), Some(Sex::Male));
        assert_eq!(Sex::from_label("unknown"), None);
        assert_eq!(Sex::from_label(""), None);
    }

    #[test]
    fn reads_assignment_table() {
        let input = "S1\tmale\nS2\tfemale\r\n\nS3\tmale\textra\n";
        let assignment =
            SexAssignment::from_reader(Cursor::new(input), SexLabelPolicy::Reject).unwrap();
        assert_eq!(assignment.len(), 3);
        assert_eq!(assignment.males().collect::<Vec<_>>(), vec!["S1", "S3"]);
        assert_eq!(assignment.females().collect::<Vec<_>>(), vec!["S2"]);
    }

    #[test]
    fn unknown_label_is_rejected_by_default() {
        let input = "S1\tmale\nS2\tunknown\n";
        let err =
            SexAssignment::from_reader(Cursor::new(input), SexLabelPolicy::Reject).unwrap_err();
        match err {
            SexAssignmentError::MissingSexLabel {
                line,
                sample,
                label,
            } => {
                assert_eq!(line, 2);
                assert_eq!(sample, "S2");
                assert_eq!(label, "unknown");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_label_can_be_skipped() {
        let input = "S1\tmale\nS2\tunknown\n";
        let assignment =
            SexAssignment::from_reader(Cursor::new(input), SexLabelPolicy::Skip).unwrap();
        assert_eq!(assignment.len(), 1);
    }

    #[test]
    fn line_without_label_is_malformed() {
        let err = SexAssignment::from_reader(Cursor::new("S1\n"), SexLabelPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, SexAssignmentError::MalformedLine { line: 1 }));
    }

    #[test]
    fn all_samples_are_male_without_assignment() {
        let males = MaleColumns::from_header(HEADER, None).unwrap();
        assert_eq!(males.columns(), &[9, 10, 11]);
        assert_eq!(males.male_count(), 3);
        assert_eq!(males.sample_count(), 3);
        assert!(!males.is_male(8));
        assert!(males.is_male(11));
        assert!(!males.is_male(12));
        assert_eq!(males.sample_name(10), Some("S2"));
        assert_eq!(males.sample_name(3), None);
    }

    #[test]
    fn assignment_selects_male_columns_in_header_order() {
        let assignment: SexAssignment = [
            ("S3", Sex::Male),
            ("S2", Sex::Female),
            ("S1", Sex::Male),
        ]
        .into_iter()
        .collect();
        let males = MaleColumns::from_header(HEADER, Some(&assignment)).unwrap();
        assert_eq!(males.columns(), &[9, 11]);
        assert_eq!(males.male_count(), 2);
        assert_eq!(males.sample_count(), 3);
        assert!(!males.is_male(10));
    }

    #[test]
    fn differing_sample_sets_are_a_configuration_mismatch() {
        let assignment: SexAssignment = [
            ("S1", Sex::Male),
            ("S2", Sex::Female),
            ("S4", Sex::Male),
        ]
        .into_iter()
        .collect();
        let err = MaleColumns::from_header(HEADER, Some(&assignment)).unwrap_err();
        assert_eq!(
            err,
            SampleError::ConfigurationMismatch {
                header_count: 3,
                assignment_count: 3,
                missing_from_header: vec!["S4".to_string()],
                missing_from_assignment: vec!["S3".to_string()],
            }
        );
        assert!(err.to_string().contains("not in VCF header: S4"));
    }

    #[test]
    fn differing_sample_counts_are_a_configuration_mismatch() {
        let assignment: SexAssignment = [("S1", Sex::Male), ("S2", Sex::Female)]
            .into_iter()
            .collect();
        let err = MaleColumns::from_header(HEADER, Some(&assignment)).unwrap_err();
        assert!(matches!(
            err,
            SampleError::ConfigurationMismatch {
                header_count: 3,
                assignment_count: 2,
                ..
            }
        ));

        let duplicated: SexAssignment = [
            ("S1", Sex::Male),
            ("S1", Sex::Male),
            ("S2", Sex::Female),
        ]
        .into_iter()
        .collect();
        assert!(MaleColumns::from_header(HEADER, Some(&duplicated)).is_err());
    }

    #[test]
    fn header_without_samples_is_rejected() {
        let header = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO";
        assert_eq!(
            MaleColumns::from_header(header, None),
            Err(SampleError::NoSamples)
        );
    }
}
