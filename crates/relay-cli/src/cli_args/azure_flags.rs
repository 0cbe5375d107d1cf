use clap::Args;

/// Azure DevOps access for pipeline commands.
#[derive(Debug, Args)]
pub(crate) struct CliAzureFlags {
    #[arg(
        long = "azure-devops-org-url",
        env = "AZURE_DEVOPS_ORG_URL",
        help = "Azure DevOps organization URL, e.g. https://dev.azure.com/my-org"
    )]
    pub azure_devops_org_url: Option<String>,

    #[arg(
        long = "azure-devops-token",
        env = "AZURE_DEVOPS_TOKEN",
        hide_env_values = true,
        requires = "azure_devops_org_url",
        help = "Azure DevOps personal access token used to start pipeline runs"
    )]
    pub azure_devops_token: Option<String>,
}
