//! The deployment script: deploy `Publication`, set it up, verify on public networks.

use anyhow::Result;

use crate::{
    ArtifactRegistry, ChainClient, ContractDeployer, DeployEvent, DeployOptions, DeployReporter,
    DeploymentRecord, IndexerHook, Network, PublicationSetup, VerificationOutcome, Verifier,
    initialize_publication, verify_all,
};

/// Name of the contract the script deploys.
pub const PUBLICATION_CONTRACT: &str = "Publication";

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct ScriptOutcome {
    /// Deployed contracts, in deployment order.
    pub records: Vec<DeploymentRecord>,
    /// Empty on local networks.
    pub verifications: Vec<VerificationOutcome>,
}

/// Everything a run needs, resolved by the caller.
pub struct DeployScript<'a, C, V, I, R> {
    pub network: &'a Network,
    pub client: &'a C,
    pub registry: &'a ArtifactRegistry,
    pub verifier: &'a V,
    pub indexer: &'a I,
    pub reporter: &'a R,
    pub publication: &'a PublicationSetup,
}

impl<C, V, I, R> DeployScript<'_, C, V, I, R>
where
    C: ChainClient,
    V: Verifier,
    I: IndexerHook,
    R: DeployReporter,
{
    /// Run the whole flow.
    ///
    /// Errors before the verification phase abort the run. Verification failures are only
    /// reported and show up in [`ScriptOutcome::verifications`].
    pub async fn run(&self) -> Result<ScriptOutcome> {
        self.reporter.report(DeployEvent::NetworkResolved {
            network: self.network.clone(),
        });

        if self.network.is_local() {
            let address = self.client.sender().await?;
            let balance = self.client.balance(address).await?;
            self.reporter
                .report(DeployEvent::DeployerAccount { address, balance });
        }

        let deployer = ContractDeployer {
            client: self.client,
            registry: self.registry,
            indexer: self.indexer,
            reporter: self.reporter,
        };

        let mut records = Vec::new();

        let publication = deployer
            .deploy(
                PUBLICATION_CONTRACT,
                &[],
                &DeployOptions {
                    run_indexer_init: true,
                    overrides: self.publication.overrides.clone(),
                    libraries: self.publication.libraries.clone(),
                },
            )
            .await?;

        initialize_publication(
            self.client,
            self.reporter,
            &publication.handle,
            self.publication,
        )
        .await?;
        records.push(publication);

        let verifications = if self.network.requires_verification() {
            self.reporter.report(DeployEvent::VerificationWarning);
            verify_all(self.verifier, self.reporter, &records).await
        } else {
            Vec::new()
        };

        Ok(ScriptOutcome {
            records,
            verifications,
        })
    }
}
