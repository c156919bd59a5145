use ringtail_ntt::{PolyMatrix, RingEngine, SIGNATURE_Q};
use std::sync::Arc;

const MATRIX_SEED: &[u8] = b"public matrix A, epoch 0";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔐 Ring-LWE arithmetic demo (backend: {})", ringtail_ntt::engine::backend());

    // Step 1: engine over the signature ring
    let engine = RingEngine::builder().build()?;
    let ctx = Arc::clone(engine.context());
    println!(
        "\n⚙️  Ring: N = {}, Q = {} ({} bits), N^-1 = {}",
        ctx.degree(),
        ctx.modulus(),
        ctx.modulus().ilog2() + 1,
        ctx.n_inv()
    );

    // Step 2: public matrix from a seed, secret and error vectors
    println!("\n🎲 Expanding public matrix and sampling secrets...");
    let a = ctx.sample_matrix(2, 2, MATRIX_SEED)?.to_ntt()?;
    let secret: Vec<Vec<u64>> = (0..2u8)
        .map(|i| engine.sample_secret_key(&[b's', i]))
        .collect::<Result<_, _>>()?;
    let error: Vec<Vec<u64>> = (0..2u8)
        .map(|i| engine.sample_error(&[b'e', i]))
        .collect::<Result<_, _>>()?;
    println!("✅ A is {}x{}, secret/error vectors have length {}", a.rows(), a.cols(), secret.len());

    // Step 3: b = A·s + e
    let s_ntt = engine.vector_ntt_forward(&secret)?;
    let as_ntt = a.mul_vec(&s_ntt)?;
    let as_coeff = engine.ntt_inverse(&as_ntt)?;
    let b: Vec<Vec<u64>> = as_coeff
        .iter()
        .zip(&error)
        .map(|(x, e)| engine.poly_add(x, e))
        .collect::<Result<_, _>>()?;
    println!("\n🧮 b = A·s + e, first coefficients: {:?}", &b[0][..4]);

    // Step 4: b - e must equal A·s
    for (bi, (ei, expected)) in b.iter().zip(error.iter().zip(&as_coeff)) {
        assert_eq!(&engine.poly_sub(bi, ei)?, expected);
    }
    println!("✅ b - e == A·s");

    // Step 5: identity check and transpose
    let identity = PolyMatrix::zeros(Arc::clone(&ctx), 2, 2)?;
    let mut one = vec![0u64; ctx.degree()];
    one[0] = 1;
    identity.set(0, 0, &one)?;
    identity.set(1, 1, &one)?;
    let recovered = engine.ntt_inverse(&identity.to_ntt()?.mul_vec(&s_ntt)?)?;
    assert_eq!(recovered, secret);
    println!("✅ I·s == s");

    let t = a.transpose()?;
    assert_eq!(t.get(0, 1)?, a.get(1, 0)?);
    println!("✅ transpose swaps A[1][0] into A^T[0][1]");

    let centered: Vec<i64> = secret[0][..8]
        .iter()
        .map(|&c| if c > SIGNATURE_Q / 2 { c as i64 - SIGNATURE_Q as i64 } else { c as i64 })
        .collect();
    println!("\n🔑 s[0] starts with {centered:?}");

    engine.close();
    println!("🏁 Engine closed: ready = {}", engine.is_ready());
    Ok(())
}
