use anyhow::Result;

/// Calculate cosine similarity directly between two vectors
///
/// # Arguments
/// * `vec1` - First vector
/// * `vec2` - Second vector
///
/// # Returns
/// * `Result<f32>` - The cosine similarity or an error
pub fn calculate_direct_similarity(vec1: &[f32], vec2: &[f32]) -> Result<f32> {
    if vec1.len() != vec2.len() {
        return Err(anyhow::anyhow!(
            "Vector dimensions don't match: {} vs {}",
            vec1.len(),
            vec2.len()
        ));
    }

    let mag1 = magnitude(vec1);
    let mag2 = magnitude(vec2);

    if mag1 < 0.001 || mag2 < 0.001 {
        return Err(anyhow::anyhow!("Zero magnitude vector detected"));
    }

    let dot_product: f32 = vec1.iter().zip(vec2.iter()).map(|(a, b)| a * b).sum();
    let similarity = dot_product / (mag1 * mag2);

    Ok(similarity)
}

pub fn magnitude(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}
