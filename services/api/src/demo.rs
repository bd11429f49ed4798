use std::sync::Arc;

use crate::infra::{
    guess_content_type, standard_inputs, standard_key, HeuristicReasoningGateway,
    InMemoryBandStore, InMemoryEvidenceGateway, InMemoryMatrixCatalog, InMemoryVersionStore,
};
use clap::Args;

use accredit_ai::error::AppError;
use accredit_ai::workflows::assessment::{AssessmentService, AuthorId, EvidenceUpload, UnitId};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Unit whose submission the demo edits
    #[arg(long, default_value = "informatics")]
    pub(crate) unit: String,
    /// Foreign unit shown as the read-only reference
    #[arg(long, default_value = "mathematics")]
    pub(crate) reference: String,
    /// Author recorded on the demo commits
    #[arg(long, default_value = "demo-assessor")]
    pub(crate) author: String,
    /// Evidence file name linked to the first criterion row
    #[arg(long, default_value = "teaching-load-summary.pdf")]
    pub(crate) evidence: String,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let evidence_gateway = Arc::new(InMemoryEvidenceGateway::default());
    let service = AssessmentService::new(
        Arc::new(InMemoryMatrixCatalog::standard()),
        Arc::new(InMemoryVersionStore::default()),
        Arc::new(InMemoryBandStore::with_defaults()),
        evidence_gateway.clone(),
        Arc::new(HeuristicReasoningGateway),
    );
    let unit = UnitId(args.unit);
    let reference = UnitId(args.reference);
    let author = AuthorId(args.author);
    let key = standard_key();

    println!("== workspace before any commit ==");
    let workspace = service.workspace(&unit, &key, Some(&reference))?;
    println!(
        "matrix {} with {} criterion rows; version: {}",
        workspace.matrix.key,
        workspace.matrix.criterion_seqs().len(),
        workspace
            .version
            .as_ref()
            .map(|stamp| stamp.message.clone())
            .unwrap_or_else(|| "<none, synthesized default>".to_string()),
    );

    println!("\n== first commit ==");
    let mut draft = workspace.answers.clone();
    if let Some(entry) = draft.entry_mut("3") {
        entry.answer =
            "Core courses are covered by twelve full-time staff; two sections use adjuncts."
                .to_string();
    }
    let version = service.commit(&unit, &key, draft.clone(), "initial submission", &author)?;
    println!("version {} at {}", version.id.0, version.created_at);

    println!("\n== evidence upload ==");
    let uploads = vec![EvidenceUpload {
        content_type: Some(guess_content_type(&args.evidence)),
        name: args.evidence,
        bytes: b"demo evidence".to_vec(),
    }];
    let entry_files = draft
        .entry("3")
        .map(|entry| entry.files.clone())
        .unwrap_or_default();
    let files = service.attach_evidence(&unit, &key, "3", &entry_files, uploads)?;
    if let Some(entry) = draft.entry_mut("3") {
        entry.files = files.clone();
    }
    for file in &files {
        println!("linked {} -> {}", file.name, file.url);
    }

    // Upload a throwaway file and remove it again; the stored copy triggers
    // a remote delete on the way out.
    let scratch = service.attach_evidence(
        &unit,
        &key,
        "4",
        &[],
        vec![EvidenceUpload {
            name: "scratch-notes.txt".to_string(),
            content_type: Some(guess_content_type("scratch-notes.txt")),
            bytes: b"temporary".to_vec(),
        }],
    )?;
    let remaining = service.detach_evidence(&scratch, &scratch[0])?;
    println!(
        "scratch upload removed ({} left, {} remote delete issued)",
        remaining.len(),
        evidence_gateway.deleted().len()
    );

    println!("\n== second commit and history ==");
    service.commit(&unit, &key, draft.clone(), "linked evidence", &author)?;
    for version in service.history(&unit, &key)? {
        println!(
            "#{} {} ({} by {})",
            version.id.0, version.message, version.created_at, version.author.0
        );
    }

    println!("\n== reference view ==");
    let workspace = service.workspace(&unit, &key, Some(&reference))?;
    if let Some(view) = workspace.reference {
        println!(
            "unit {} has {} entries ({})",
            view.unit,
            view.answers.entries.len(),
            view.message
                .unwrap_or_else(|| "no committed version".to_string())
        );
    }

    println!("\n== quantitative score ==");
    let score = service.quantitative_score(&key, &standard_inputs())?;
    println!("counted inputs score: {score:.2}");

    println!("\n== qualitative review ==");
    let (reviewed, review) = service.qualitative_review(&unit, &key, "3", Some(draft))?;
    println!("score {:.2}: {}", review.score, review.feedback);
    if let Some(entry) = reviewed.entry("3") {
        println!(
            "entry now carries score {:?} with feedback on file",
            entry.score
        );
    }

    println!("\n== score bands ==");
    for band in service.score_bands()? {
        println!(
            "{}: [{}, {})",
            band.color, band.range_start, band.range_end
        );
    }

    Ok(())
}
