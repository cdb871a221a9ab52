use std::io::Write;

use assert_matches::assert_matches;

use patric_amr::domain::{MetadataRow, Phenotype};
use patric_amr::error::AmrError;
use patric_amr::labels::{AmrLabels, LabelQuery, labels_for, labels_from_rows, labels_in};
use patric_amr::metadata::MetadataTable;

fn row(id: &str, species: &str, antibiotic: &str, phenotype: &str) -> MetadataRow {
    MetadataRow {
        genome_id: id.to_string(),
        genome_name: species.to_string(),
        antibiotic: antibiotic.to_string(),
        resistant_phenotype: phenotype.to_string(),
    }
}

fn rows() -> Vec<MetadataRow> {
    vec![
        row("1", "escherichia coli", "ampicillin", "Resistant"),
        row("2", "escherichia coli", "ampicillin", "Susceptible"),
        row("3", "escherichia coli", "ampicillin", "Intermediate"),
        row("4", "escherichia coli", "ampicillin", "Not defined"),
        row("5", "klebsiella pneumoniae", "ampicillin", "Non-susceptible"),
        row("6", "klebsiella pneumoniae", "ampicillin", "Nonsusceptible"),
        row("7", "klebsiella pneumoniae", "ampicillin", "Resistant"),
        row("7", "klebsiella pneumoniae", "ampicillin", "Resistant"),
        row("8", "klebsiella pneumoniae", "ciprofloxacin", "Susceptible"),
    ]
}

#[test]
fn contradictory_genome_is_dropped() {
    let rows = vec![
        row("g1", "e coli", "amp", "Resistant"),
        row("g1", "e coli", "amp", "Susceptible"),
        row("g2", "e coli", "amp", "Resistant"),
    ];
    let labels = labels_from_rows(rows, &LabelQuery::new("amp")).unwrap();
    assert_eq!(
        labels,
        AmrLabels {
            genome_names: vec!["e coli".to_string()],
            genome_ids: vec!["g2".to_string()],
            phenotypes: vec![1],
        }
    );
}

#[test]
fn noise_labels_never_appear() {
    let labels = labels_from_rows(rows(), &LabelQuery::new("Ampicillin").keep_intermediate())
        .unwrap();
    assert_eq!(labels.genome_ids, vec!["1", "2", "3", "7"]);
    assert_eq!(labels.phenotypes, vec![1, 0, 2, 1]);
    for id in ["4", "5", "6"] {
        assert!(!labels.genome_ids.contains(&id.to_string()));
    }
}

#[test]
fn intermediate_dropped_by_default() {
    let labels = labels_from_rows(rows(), &LabelQuery::new("ampicillin")).unwrap();
    assert_eq!(labels.genome_ids, vec!["1", "2", "7"]);
    assert_eq!(labels.count(Phenotype::Intermediate), 0);
    assert_eq!(labels.count(Phenotype::Resistant), 2);
    assert_eq!(labels.count(Phenotype::Susceptible), 1);
}

#[test]
fn arrays_stay_aligned() {
    let labels = labels_from_rows(rows(), &LabelQuery::new("ampicillin").keep_intermediate())
        .unwrap();
    assert_eq!(labels.genome_names.len(), labels.len());
    assert_eq!(labels.genome_ids.len(), labels.len());

    let source = rows();
    for index in 0..labels.len() {
        let original = source
            .iter()
            .find(|row| row.genome_id == labels.genome_ids[index])
            .unwrap();
        assert_eq!(original.genome_name, labels.genome_names[index]);
        let expected = Phenotype::from_label(&original.resistant_phenotype).unwrap();
        assert_eq!(expected.code(), labels.phenotypes[index]);
    }
}

#[test]
fn species_filter_is_case_insensitive() {
    let query = LabelQuery::new("ampicillin").with_species(["Klebsiella Pneumoniae", "unknown organism"]);
    let labels = labels_from_rows(rows(), &query).unwrap();
    assert_eq!(labels.genome_ids, vec!["7"]);
    assert_eq!(labels.genome_names, vec!["klebsiella pneumoniae"]);

    let query = LabelQuery::new("ampicillin").with_species(Vec::<String>::new());
    assert!(labels_from_rows(rows(), &query).unwrap().is_empty());
}

#[test]
fn unknown_antibiotic_yields_empty_labels() {
    let labels = labels_from_rows(rows(), &LabelQuery::new("vancomycin")).unwrap();
    assert!(labels.is_empty());
}

#[test]
fn too_many_labels_abort_with_the_label_set() {
    let mut rows = rows();
    rows.push(row("9", "escherichia coli", "ampicillin", "Susceptible-dose dependent"));
    let err = labels_from_rows(rows, &LabelQuery::new("ampicillin")).unwrap_err();
    assert_matches!(&err, AmrError::UnexpectedPhenotypes(labels) if labels.contains(&"Susceptible-dose dependent".to_string()));
    assert!(err.to_string().contains("Susceptible-dose dependent"));
}

#[test]
fn unknown_label_codes_as_susceptible() {
    let rows = vec![
        row("1", "escherichia coli", "ampicillin", "Resistant"),
        row("2", "escherichia coli", "ampicillin", "Sensitive"),
    ];
    let labels = labels_from_rows(rows, &LabelQuery::new("ampicillin")).unwrap();
    assert_eq!(labels.genome_ids, vec!["1", "2"]);
    assert_eq!(labels.phenotypes, vec![1, 0]);
}

#[test]
fn path_and_table_sources_agree() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "genome_id\tgenome_name\tantibiotic\tresistant_phenotype").unwrap();
    writeln!(file, "1.1\tEscherichia coli K-12\tampicillin\tResistant").unwrap();
    writeln!(file, "1.2\tEscherichia coli O157\tAMPICILLIN\tSusceptible").unwrap();
    writeln!(file, "1.3\tEscherichia coli\tampicillin\tNot defined").unwrap();

    let query = LabelQuery::new("Ampicillin");
    let from_path = labels_for(file.path(), &query).unwrap();
    let table = MetadataTable::from_path(file.path()).unwrap();
    let from_table = labels_in(&table, &query).unwrap();
    assert_eq!(from_path, from_table);
    assert_eq!(from_path.genome_ids, vec!["1.1", "1.2"]);
    assert_eq!(from_path.phenotypes, vec![1, 0]);
}
