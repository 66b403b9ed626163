use clap::Parser;
use netgate_model::{BoxError, Gateway, Ingress};
use netgate_reconciler::{
    config::ReconcilerConfig,
    service::{k8s::K8s, memory::Memory, ObjectStore, Retrieve},
};
mod args;
mod plan;

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();
    let args = args::Args::parse();
    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().thread_name(env!("CARGO_PKG_NAME")).build()?;
    rt.block_on(run(args))
}

async fn run(args: args::Args) -> Result<(), BoxError> {
    let config = match &args.config {
        Some(path) => ReconcilerConfig::from_file(path).await?,
        None => ReconcilerConfig::default(),
    };
    let k8s = K8s::with_default_client(args.namespace.as_str()).await?;
    let ingress = Retrieve::<Ingress>::get(&k8s, &args.namespace, &args.ingress)
        .await?
        .ok_or_else(|| format!("ingress {}/{} not found", args.namespace, args.ingress))?;
    let plan = plan::Plan::build(&k8s, &config, &ingress).await?;

    if args.dry_run {
        let memory = Memory::new(plan.snapshot(&k8s).await?);
        execute(&plan, &memory, &config, args.finalize).await?;
        println!("{}", serde_json::to_string_pretty(&memory.objects().await)?);
    } else {
        execute(&plan, &k8s, &config, args.finalize).await?;
    }
    Ok(())
}

async fn execute<S: ObjectStore<Gateway>>(plan: &plan::Plan, store: &S, config: &ReconcilerConfig, finalize: bool) -> Result<(), BoxError> {
    let result = if finalize { plan.finalize(store, &config.retry).await } else { plan.apply(store, &config.retry).await };
    if let Err(e) = &result {
        if e.is_retryable() {
            tracing::warn!("[NG] reconcile of {:?} should be requeued: {e}", plan.owner);
        }
    }
    Ok(result?)
}
