use multipart_upload::UploadSession;

// Usage: cargo run --example upload_file -- <url> <tenant-id> <token> <file> [caption]
#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 4 {
        eprintln!("usage: upload_file <url> <tenant-id> <token> <file> [caption]");
        std::process::exit(2);
    }

    if let Err(err) = upload(&args).await {
        eprintln!("upload failed: {}", err);
        std::process::exit(1);
    }
}

async fn upload(args: &[String]) -> multipart_upload::Result<()> {
    let mut session = UploadSession::new(&args[0], &args[1], &args[2]).await?;

    if let Some(caption) = args.get(4) {
        session.add_form_field("caption", caption).await?;
    }

    let file_name = session.add_file("file", &args[3]).await?;
    println!("Uploading {} with boundary {}", file_name, session.boundary());

    for line in session.finish().await? {
        println!("{}", line);
    }

    Ok(())
}
